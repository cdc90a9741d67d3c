//! # Crash and Corruption Recovery
//!
//! State files written by real commits, damaged on disk, then reloaded.

#[cfg(test)]
mod tests {
    use crate::integration::fixtures::*;
    use lc_03_state_store::{DurableStateStore, LoadError, StateSource, StateStoreConfig};
    use lc_05_block_processor::ChainStateSnapshot;
    use shared_types::OutPoint;
    use std::fs;
    use tempfile::TempDir;

    /// Commit heights 0..=last and close the ledger.
    fn build_chain(config: &StateStoreConfig, actors: &Actors, last: u64) {
        let ledger = open_ledger(config.clone());
        commit_genesis(&ledger, actors);
        for _ in 0..last {
            commit_reward(&ledger, actors);
        }
        assert_eq!(ledger.chain_height(), Some(last));
    }

    #[test]
    fn test_recovered_state_resumes_commits() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        build_chain(&config, &actors, 1);
        flip_checksum(&config.primary_path());

        let ledger = open_ledger(config.clone());
        let loaded = ledger.sink().store().load::<ChainStateSnapshot>().unwrap();
        assert!(matches!(loaded.source, StateSource::Backup { .. }));
        ledger.restore_snapshot(loaded.snapshot).unwrap();
        assert_eq!(ledger.chain_height(), Some(0));
        let backups = ledger.sink().store().backups().unwrap().len();

        // Height 1 is lost with the primary; the chain continues from 0.
        let block = commit_reward(&ledger, &actors);
        assert_eq!(block.height, 1);
        assert_eq!(recorded_height(&config.primary_path()), 1);
        // The rejected primary was replaced, not rotated into the backups.
        assert_eq!(ledger.sink().store().backups().unwrap().len(), backups);
        assert!(ledger.sink().store().verify());
    }

    #[test]
    fn test_checkpoint_is_last_resort() {
        let dir = TempDir::new().unwrap();
        let mut config = store_config(dir.path());
        config.checkpoint_interval = 2;
        let actors = Actors::new();
        build_chain(&config, &actors, 3);

        flip_checksum(&config.primary_path());
        let store = DurableStateStore::open(config.clone()).unwrap();
        let backups = store.backups().unwrap();
        assert!(!backups.is_empty());
        for backup in &backups {
            flip_checksum(backup);
        }
        assert_eq!(store.checkpoints().unwrap().len(), 1);

        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        match &loaded.source {
            StateSource::Checkpoint { height, .. } => assert_eq!(*height, 2),
            other => panic!("expected checkpoint recovery, got {other}"),
        }
        assert_eq!(loaded.snapshot.tip.map(|t| t.height), Some(2));
    }

    #[test]
    fn test_legacy_backup_is_reported_unverified() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        build_chain(&config, &actors, 1);

        let store = DurableStateStore::open(config.clone()).unwrap();
        let backup = store.backups().unwrap().remove(0);
        strip_checksum(&backup);
        flip_checksum(&config.primary_path());

        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        assert_eq!(loaded.source, StateSource::UnverifiedBackup { path: backup });
        assert!(!loaded.source.is_verified());
        assert_eq!(loaded.metadata.checksum, None);
        assert_eq!(loaded.metadata.height, 0);
    }

    #[test]
    fn test_primary_without_checksum_is_rejected() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        build_chain(&config, &actors, 1);
        strip_checksum(&config.primary_path());

        let store = DurableStateStore::open(config).unwrap();
        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        assert!(matches!(loaded.source, StateSource::Backup { .. }));
        assert_eq!(loaded.metadata.height, 0);
    }

    #[test]
    fn test_everything_damaged_is_unrecoverable() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        build_chain(&config, &actors, 2);

        let store = DurableStateStore::open(config.clone()).unwrap();
        let backups = store.backups().unwrap();
        fs::write(config.primary_path(), b"\0\0\0").unwrap();
        for backup in &backups {
            flip_checksum(backup);
        }

        match store.load::<ChainStateSnapshot>() {
            Err(LoadError::Unrecoverable { attempts }) => {
                assert_eq!(attempts.len(), 1 + backups.len());
                assert_eq!(attempts[0].path, config.primary_path());
            }
            other => panic!("expected an unrecoverable state, got {:?}", other.map(|l| l.source)),
        }
    }

    #[test]
    fn test_failed_commit_never_reaches_disk() {
        let dir = TempDir::new().unwrap();
        let config = store_config(dir.path());
        let actors = Actors::new();
        {
            let ledger = open_ledger(config.clone());
            let genesis = commit_genesis(&ledger, &actors);
            let pay = transfer(
                &ledger,
                &actors.alice,
                actors.bob.address(),
                OutPoint::new(genesis, 0),
                60,
                35,
                5,
            );
            ledger.sink().set_failing(true);
            assert!(ledger
                .commit(seal(&ledger, &actors.proposer, vec![pay]))
                .is_err());
        }

        let store = DurableStateStore::open(config).unwrap();
        let loaded = store.load::<ChainStateSnapshot>().unwrap();
        assert_eq!(loaded.source, StateSource::Primary);
        assert_eq!(loaded.metadata.height, 0);
        assert!(loaded.snapshot.nonces.get(&actors.alice.address()).is_none());
        assert!(store.backups().unwrap().is_empty());
    }
}
