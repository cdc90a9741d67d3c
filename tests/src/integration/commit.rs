//! # Commit Pipeline Against the Durable Store
//!
//! Validator, UTXO store, nonce tracker, mempool and state store exercised
//! together through `Ledger`.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use lc_03_state_store::{DurableStateStore, StateSource};
    use lc_04_tx_validation::RejectionReason;
    use lc_05_block_processor::{
        candidate_block, seal_block, BlockOutcome, ChainStateSnapshot, CommitError, OrphanStatus,
    };
    use shared_types::OutPoint;
    use tempfile::TempDir;

    #[test]
    fn test_second_spend_in_later_block_rolls_back() {
        let dir = TempDir::new().unwrap();
        let actors = Actors::new();
        let ledger = open_ledger(store_config(dir.path()));
        let genesis = commit_genesis(&ledger, &actors);
        let funding = OutPoint::new(genesis, 0);

        let first = transfer(&ledger, &actors.alice, actors.bob.address(), funding, 60, 35, 5);
        ledger
            .commit(seal(&ledger, &actors.proposer, vec![first]))
            .unwrap();
        let digest = ledger.utxo_digest().unwrap();

        let again = transfer(&ledger, &actors.alice, actors.bob.address(), funding, 60, 35, 5);
        let block = seal(
            &ledger,
            &actors.proposer,
            vec![
                coinbase(&ledger, &actors.proposer, &[(actors.proposer.address(), 10)]),
                again,
            ],
        );
        let err = ledger.commit(block).unwrap_err();
        assert!(matches!(
            err,
            CommitError::TransactionRejected {
                index: 1,
                reason: RejectionReason::UnknownInput(_),
                ..
            }
        ));

        assert_eq!(ledger.chain_height(), Some(1));
        assert_eq!(ledger.utxo_digest().unwrap(), digest);
        // The coinbase ahead of the bad transaction was undone too.
        assert_eq!(ledger.nonce(&actors.proposer.address()), 1);
        assert_eq!(ledger.balance(&actors.proposer.address()).unwrap(), 0);
        assert_eq!(recorded_height(&store_config(dir.path()).primary_path()), 1);
    }

    #[test]
    fn test_value_is_conserved_across_blocks() {
        let dir = TempDir::new().unwrap();
        let actors = Actors::new();
        let ledger = open_ledger(store_config(dir.path()));
        let genesis = commit_genesis(&ledger, &actors);

        let txs = vec![
            transfer(
                &ledger,
                &actors.alice,
                actors.bob.address(),
                OutPoint::new(genesis, 0),
                70,
                28,
                2,
            ),
            transfer(
                &ledger,
                &actors.bob,
                actors.alice.address(),
                OutPoint::new(genesis, 1),
                10,
                37,
                3,
            ),
        ];
        ledger
            .commit(seal(&ledger, &actors.proposer, txs))
            .unwrap();

        // Fees are not credited, so 150 minted minus 5 in fees remains.
        let snapshot = ledger.snapshot().unwrap();
        let unspent: u64 = snapshot
            .utxos
            .entries
            .iter()
            .filter(|u| !u.spent)
            .map(|u| u.amount)
            .sum();
        assert_eq!(unspent, 145);
        let accounts = [actors.alice.address(), actors.bob.address()];
        let balances: u64 = accounts
            .iter()
            .map(|a| ledger.balance(a).unwrap())
            .sum();
        assert_eq!(balances, 145);
    }

    #[test]
    fn test_out_of_order_blocks_are_held_then_committed() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        let ledger = open_ledger(config.clone());
        commit_genesis(&ledger, &actors);

        let proposer = &actors.proposer;
        let reward = [(proposer.address(), 1)];
        let mut first = candidate_block(ledger.tip(), NOW, vec![coinbase_with_nonce(proposer, 2, &reward)]);
        seal_block(&mut first, proposer).unwrap();
        let mut second =
            candidate_block(Some(first.tip()), NOW, vec![coinbase_with_nonce(proposer, 3, &reward)]);
        seal_block(&mut second, proposer).unwrap();

        let held = ledger.submit_block(second.clone()).unwrap();
        assert_eq!(
            held,
            BlockOutcome::Orphaned {
                height: 2,
                status: OrphanStatus::Held
            }
        );
        assert_eq!(ledger.orphan_count(), 1);

        match ledger.submit_block(first).unwrap() {
            BlockOutcome::Committed {
                receipt, promoted, ..
            } => {
                assert_eq!(receipt.height, 1);
                assert_eq!(promoted.len(), 1);
                assert_eq!(promoted[0].hash, second.hash);
            }
            other => panic!("expected a commit, got {other:?}"),
        }
        assert_eq!(ledger.chain_height(), Some(2));
        assert_eq!(ledger.orphan_count(), 0);
        assert_eq!(ledger.balance(&proposer.address()).unwrap(), 2);
        drop(ledger);

        let store = DurableStateStore::open(config).unwrap();
        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        assert_eq!(loaded.source, StateSource::Primary);
        assert_eq!(loaded.snapshot.tip, Some(second.tip()));
    }

    #[test]
    fn test_restart_continues_the_chain() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        let genesis;
        {
            let ledger = open_ledger(config.clone());
            genesis = commit_genesis(&ledger, &actors);
            let pending = transfer(
                &ledger,
                &actors.alice,
                actors.bob.address(),
                OutPoint::new(genesis, 0),
                60,
                35,
                5,
            );
            ledger.submit_transaction(pending).unwrap();
            // The mempool is persisted with the next commit.
            commit_reward(&ledger, &actors);
        }

        let ledger = open_ledger(config.clone());
        let loaded = ledger
            .sink()
            .store()
            .load::<ChainStateSnapshot>()
            .unwrap();
        ledger.restore_snapshot(loaded.snapshot).unwrap();
        assert_eq!(ledger.chain_height(), Some(1));
        assert_eq!(ledger.chain_len(), 0);
        assert_eq!(ledger.mempool_len(), 1);
        assert_eq!(ledger.balance(&actors.alice.address()).unwrap(), 100);

        let block = seal(&ledger, &actors.proposer, ledger.mempool());
        let receipt = ledger.commit(block).unwrap();
        assert_eq!(receipt.height, 2);
        assert_eq!(receipt.balances[&actors.bob.address()], 110);
        assert_eq!(ledger.mempool_len(), 0);
    }
}
