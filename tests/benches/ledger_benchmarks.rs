//! # Ledger-Core Benchmarks
//!
//! | Component | Operation |
//! |-----------|-----------|
//! | lc-02 UTXO Store | `digest()` over a populated set |
//! | lc-04 Validation | stateless batch (signature-bound) |
//! | lc-05 Block Processor | merkle root of a block |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lc_02_utxo_store::{MemoryBackend, SpendCondition, UtxoStore};
use lc_04_tx_validation::{TransactionSigner, TransactionValidator, ValidationConfig};
use lc_05_block_processor::merkle_root_of_ids;
use rand::Rng;
use shared_types::{Address, Hash, Transaction, TxInput, TxOutput};
use std::time::{SystemTime, UNIX_EPOCH};

fn random_hashes(count: usize) -> Vec<Hash> {
    let mut rng = rand::thread_rng();
    (0..count).map(|_| rng.gen()).collect()
}

fn bench_merkle_root(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-05-merkle-root");
    for size in [1usize, 64, 1024, 8192] {
        let ids = random_hashes(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &ids, |b, ids| {
            b.iter(|| merkle_root_of_ids(black_box(ids.clone())))
        });
    }
    group.finish();
}

fn bench_utxo_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-02-utxo-digest");
    for size in [1_000usize, 10_000] {
        let store = UtxoStore::new(MemoryBackend::new()).unwrap();
        let mut rng = rand::thread_rng();
        for tx_id in random_hashes(size) {
            let owner = Address(rng.gen());
            store
                .add(owner, tx_id, 0, rng.gen_range(1..1_000), SpendCondition::Owner)
                .unwrap();
        }
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(BenchmarkId::from_parameter(size), |b| {
            b.iter(|| store.digest().unwrap())
        });
    }
    group.finish();
}

fn bench_stateless_batch(c: &mut Criterion) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let signer = TransactionSigner::from_secret_bytes(&[0x11; 32]).unwrap();
    let recipient = Address([0x22; 20]);
    let txs: Vec<Transaction> = random_hashes(256)
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let mut tx = Transaction::draft(signer.address(), 10, 1, i as u64 + 1, now);
            tx.recipient = Some(recipient);
            tx.inputs = vec![TxInput::new(source, 0)];
            tx.outputs = vec![TxOutput::new(recipient, 10)];
            signer.sign(&mut tx).unwrap();
            tx
        })
        .collect();
    let validator = TransactionValidator::new(ValidationConfig::default());

    let mut group = c.benchmark_group("lc-04-validation");
    group.throughput(Throughput::Elements(txs.len() as u64));
    group.bench_function("stateless-batch-256", |b| {
        b.iter(|| validator.check_stateless_batch(black_box(&txs)))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_merkle_root,
    bench_utxo_digest,
    bench_stateless_batch
);
criterion_main!(benches);
