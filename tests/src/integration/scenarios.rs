//! # Reference Scenarios
//!
//! 1. Spend-once on the UTXO store
//! 2. Nonce gap rejected by the validator
//! 3. Stored merkle root matches an independent computation
//! 4. Failed `persist` leaves height and nonces untouched
//! 5. Corrupted primary checksum recovers from the backup

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use lc_01_nonce_tracker::NonceTracker;
    use lc_02_utxo_store::{MemoryBackend, SpendCondition, UtxoStore};
    use lc_03_state_store::{DurableStateStore, StateSource};
    use lc_04_tx_validation::{RejectionReason, TransactionValidator, ValidationConfig};
    use lc_05_block_processor::{
        merkle_root, merkle_root_of_ids, ChainStateSnapshot, CommitError,
    };
    use shared_types::{Address, Hash, OutPoint, Transaction, TxInput, TxOutput};
    use tempfile::TempDir;

    fn label(name: &str) -> Hash {
        let mut hash = [0u8; 32];
        hash[..name.len()].copy_from_slice(name.as_bytes());
        hash
    }

    #[test]
    fn test_scenario_1_output_spends_once() {
        let store = UtxoStore::new(MemoryBackend::new()).unwrap();
        let owner = Address([0xA1; 20]);
        let tx1 = label("tx1");

        assert!(store
            .add(owner, tx1, 0, 100, SpendCondition::Owner)
            .unwrap());
        assert_eq!(store.balance(&owner).unwrap(), 100);

        assert!(store.mark_spent(&tx1, 0).unwrap());
        assert_eq!(store.balance(&owner).unwrap(), 0);

        assert!(!store.mark_spent(&tx1, 0).unwrap());
        assert_eq!(store.balance(&owner).unwrap(), 0);
        // Spent entries stay on record but are no longer returned by `get`.
        assert!(store.get(&tx1, 0).unwrap().is_none());
        assert!(store.entry(&OutPoint::new(tx1, 0)).unwrap().unwrap().spent);
    }

    #[test]
    fn test_scenario_2_nonce_gap_rejected() {
        let actors = Actors::new();
        let alice = actors.alice.address();
        let funding = label("funding");

        let utxos = UtxoStore::new(MemoryBackend::new()).unwrap();
        utxos
            .add(alice, funding, 0, 100, SpendCondition::Owner)
            .unwrap();
        let nonces = NonceTracker::new();
        nonces.advance(&alice, 3).unwrap();
        assert_eq!(nonces.current(&alice), 3);

        let validator = TransactionValidator::with_clock(ValidationConfig::default(), FixedClock);
        let with_nonce = |nonce: u64| {
            let mut tx = Transaction::draft(alice, 60, 5, nonce, NOW);
            tx.recipient = Some(actors.bob.address());
            tx.inputs = vec![TxInput::new(funding, 0)];
            tx.outputs = vec![
                TxOutput::new(actors.bob.address(), 60),
                TxOutput::new(alice, 35),
            ];
            actors.alice.sign(&mut tx).unwrap();
            tx
        };

        let gap = validator.validate(&with_nonce(5), &utxos, &nonces);
        assert_eq!(
            gap,
            Err(RejectionReason::NonceMismatch {
                expected: 4,
                actual: 5
            })
        );
        assert_eq!(gap.unwrap_err().code(), "nonce_mismatch");

        assert!(validator
            .validate(&with_nonce(3), &utxos, &nonces)
            .is_err());
        assert_eq!(validator.validate(&with_nonce(4), &utxos, &nonces), Ok(()));
        assert!(!nonces.validate(&alice, 5));
        assert!(nonces.validate(&alice, 4));
    }

    #[test]
    fn test_scenario_3_merkle_root_matches_independent_computation() {
        let dir = TempDir::new().unwrap();
        let actors = Actors::new();
        let ledger = open_ledger(store_config(dir.path()));
        let genesis = commit_genesis(&ledger, &actors);

        let txs = vec![
            coinbase(&ledger, &actors.proposer, &[(actors.proposer.address(), 10)]),
            transfer(
                &ledger,
                &actors.alice,
                actors.bob.address(),
                OutPoint::new(genesis, 0),
                60,
                35,
                5,
            ),
            transfer(
                &ledger,
                &actors.bob,
                actors.alice.address(),
                OutPoint::new(genesis, 1),
                20,
                25,
                5,
            ),
        ];
        let receipt = ledger
            .commit(seal(&ledger, &actors.proposer, txs.clone()))
            .unwrap();
        assert_eq!(receipt.height, 1);
        assert_eq!(receipt.tx_count, 3);

        let stored = ledger.block_at(1).unwrap();
        assert_eq!(merkle_root(&txs), stored.merkle_root);
        let ids: Vec<Hash> = txs.iter().map(|tx| tx.id.unwrap()).collect();
        assert_eq!(merkle_root_of_ids(ids), stored.merkle_root);

        assert_eq!(receipt.balances[&actors.alice.address()], 55);
        assert_eq!(receipt.balances[&actors.bob.address()], 85);
        assert_eq!(receipt.balances[&actors.proposer.address()], 10);
    }

    #[test]
    fn test_scenario_4_failed_persist_leaves_state_untouched() {
        let dir = TempDir::new().unwrap();
        let actors = Actors::new();
        let ledger = open_ledger(store_config(dir.path()));
        let genesis = commit_genesis(&ledger, &actors);
        let alice = actors.alice.address();

        let pay = transfer(
            &ledger,
            &actors.alice,
            actors.bob.address(),
            OutPoint::new(genesis, 0),
            60,
            35,
            5,
        );
        ledger.submit_transaction(pay.clone()).unwrap();
        let digest = ledger.utxo_digest().unwrap();
        let nonces = ledger.nonce_snapshot();

        let block = seal(
            &ledger,
            &actors.proposer,
            vec![
                coinbase(&ledger, &actors.proposer, &[(actors.proposer.address(), 10)]),
                pay,
            ],
        );
        ledger.sink().set_failing(true);
        let err = ledger.commit(block.clone()).unwrap_err();
        assert!(matches!(err, CommitError::Persistence(_)));
        assert!(err.is_clean());

        assert_eq!(ledger.chain_height(), Some(0));
        assert_eq!(ledger.chain_len(), 1);
        assert_eq!(ledger.nonce(&alice), 0);
        assert_eq!(ledger.nonce_snapshot(), nonces);
        assert_eq!(ledger.utxo_digest().unwrap(), digest);
        assert_eq!(ledger.mempool_len(), 1);
        assert_eq!(ledger.balance(&alice).unwrap(), 100);
        assert_eq!(recorded_height(&store_config(dir.path()).primary_path()), 0);

        ledger.sink().set_failing(false);
        assert_eq!(ledger.commit(block).unwrap().height, 1);
        assert_eq!(ledger.nonce(&alice), 1);
        assert_eq!(ledger.mempool_len(), 0);
    }

    #[test]
    fn test_scenario_5_corrupt_checksum_recovers_from_backup() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        {
            let ledger = open_ledger(config.clone());
            commit_genesis(&ledger, &actors);
            commit_reward(&ledger, &actors);
            assert_eq!(ledger.sink().store().backups().unwrap().len(), 1);
        }
        assert_eq!(recorded_height(&config.primary_path()), 1);
        flip_checksum(&config.primary_path());

        let store = DurableStateStore::open(config).unwrap();
        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        assert!(matches!(loaded.source, StateSource::Backup { .. }));
        assert!(loaded.source.is_verified());
        assert_eq!(loaded.metadata.height, 0);
        assert_eq!(loaded.snapshot.tip.map(|t| t.height), Some(0));
    }
}
