//! Shared builders for the integration tests.

use lc_02_utxo_store::{MemoryBackend, UtxoStore};
use lc_03_state_store::{DurableStateStore, PersistenceError, StateStoreConfig};
use lc_04_tx_validation::{TimeSource, TransactionSigner};
use lc_05_block_processor::{
    candidate_block, seal_block, ChainStateSnapshot, Ledger, LedgerConfig, StateSink,
};
use serde_json::Value;
use shared_types::{Address, Amount, Block, Hash, OutPoint, Transaction, TxInput, TxKind, TxOutput};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

pub const NOW: u64 = 1_700_000_000;

pub struct FixedClock;

impl TimeSource for FixedClock {
    fn now(&self) -> u64 {
        NOW
    }
}

/// The real durable store with a switch that makes `persist` fail.
pub struct FlakyStore {
    store: DurableStateStore,
    fail: AtomicBool,
}

impl FlakyStore {
    pub fn open(config: StateStoreConfig) -> Self {
        Self {
            store: DurableStateStore::open(config).unwrap(),
            fail: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn store(&self) -> &DurableStateStore {
        &self.store
    }
}

impl StateSink for FlakyStore {
    fn persist(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PersistenceError::Serialization("disk unplugged".into()));
        }
        StateSink::persist(&self.store, snapshot)
    }

    fn checkpoint_due(&self, height: u64) -> bool {
        StateSink::checkpoint_due(&self.store, height)
    }

    fn write_checkpoint(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        StateSink::write_checkpoint(&self.store, snapshot)
    }
}

pub type TestLedger = Ledger<FlakyStore, MemoryBackend, FixedClock>;

pub fn store_config(dir: &Path) -> StateStoreConfig {
    StateStoreConfig::for_testing(dir)
}

pub fn open_ledger(config: StateStoreConfig) -> TestLedger {
    let utxos = UtxoStore::new(MemoryBackend::new()).unwrap();
    Ledger::with_clock(
        LedgerConfig::default(),
        FixedClock,
        utxos,
        FlakyStore::open(config),
    )
}

pub struct Actors {
    pub proposer: TransactionSigner,
    pub alice: TransactionSigner,
    pub bob: TransactionSigner,
}

impl Actors {
    pub fn new() -> Self {
        Self {
            proposer: TransactionSigner::from_secret_bytes(&[0x44; 32]).unwrap(),
            alice: TransactionSigner::from_secret_bytes(&[0x11; 32]).unwrap(),
            bob: TransactionSigner::from_secret_bytes(&[0x22; 32]).unwrap(),
        }
    }
}

/// Signed coinbase from `proposer` using `nonce`.
pub fn coinbase_with_nonce(
    proposer: &TransactionSigner,
    nonce: u64,
    outputs: &[(Address, Amount)],
) -> Transaction {
    let total = outputs.iter().map(|(_, amount)| amount).sum();
    let mut tx = Transaction::draft(proposer.address(), total, 0, nonce, NOW);
    tx.kind = TxKind::Coinbase;
    tx.outputs = outputs
        .iter()
        .map(|&(account, amount)| TxOutput::new(account, amount))
        .collect();
    proposer.sign(&mut tx).unwrap();
    tx
}

/// Signed coinbase with the proposer's next nonce on `ledger`.
pub fn coinbase(
    ledger: &TestLedger,
    proposer: &TransactionSigner,
    outputs: &[(Address, Amount)],
) -> Transaction {
    let nonce = ledger.nonce(&proposer.address()) + 1;
    coinbase_with_nonce(proposer, nonce, outputs)
}

/// Signed transfer of `send` to `to` out of `input`, returning `change` to
/// the sender.
pub fn transfer(
    ledger: &TestLedger,
    from: &TransactionSigner,
    to: Address,
    input: OutPoint,
    send: Amount,
    change: Amount,
    fee: Amount,
) -> Transaction {
    let nonce = ledger.nonce(&from.address()) + 1;
    let mut tx = Transaction::draft(from.address(), send, fee, nonce, NOW);
    tx.recipient = Some(to);
    tx.inputs = vec![TxInput::new(input.tx_id, input.index)];
    tx.outputs = vec![TxOutput::new(to, send)];
    if change > 0 {
        tx.outputs.push(TxOutput::new(from.address(), change));
    }
    from.sign(&mut tx).unwrap();
    tx
}

/// Sealed block on top of the ledger's current tip.
pub fn seal(ledger: &TestLedger, proposer: &TransactionSigner, txs: Vec<Transaction>) -> Block {
    let mut block = candidate_block(ledger.tip(), NOW, txs);
    seal_block(&mut block, proposer).unwrap();
    block
}

/// Commit a genesis block paying Alice 100 and Bob 50. Returns the coinbase
/// id; Alice owns output 0 and Bob output 1.
pub fn commit_genesis(ledger: &TestLedger, actors: &Actors) -> Hash {
    let cb = coinbase(
        ledger,
        &actors.proposer,
        &[(actors.alice.address(), 100), (actors.bob.address(), 50)],
    );
    let id = cb.id.unwrap();
    ledger.commit(seal(ledger, &actors.proposer, vec![cb])).unwrap();
    id
}

/// Commit a block whose only transaction pays the proposer 1.
pub fn commit_reward(ledger: &TestLedger, actors: &Actors) -> Block {
    let cb = coinbase(ledger, &actors.proposer, &[(actors.proposer.address(), 1)]);
    let block = seal(ledger, &actors.proposer, vec![cb]);
    ledger.commit(block.clone()).unwrap();
    block
}

fn edit_envelope(path: &Path, edit: impl FnOnce(&mut Value)) {
    let mut envelope: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    edit(&mut envelope);
    fs::write(path, serde_json::to_vec_pretty(&envelope).unwrap()).unwrap();
}

/// Change one character of the recorded checksum.
pub fn flip_checksum(path: &Path) {
    edit_envelope(path, |envelope| {
        let checksum = envelope["metadata"]["checksum"].as_str().unwrap().to_string();
        let mut bytes = checksum.into_bytes();
        bytes[0] = if bytes[0] == b'a' { b'b' } else { b'a' };
        envelope["metadata"]["checksum"] = Value::String(String::from_utf8(bytes).unwrap());
    });
}

/// Remove the checksum, turning the file into the legacy layout.
pub fn strip_checksum(path: &Path) {
    edit_envelope(path, |envelope| {
        envelope["metadata"]
            .as_object_mut()
            .unwrap()
            .remove("checksum");
    });
}

pub fn recorded_height(path: &Path) -> u64 {
    let envelope: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
    envelope["metadata"]["height"].as_u64().unwrap()
}
