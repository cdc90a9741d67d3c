//! Behaviour every backend must share, run once per backend.

use crate::domain::entities::SpendCondition;
use crate::ports::backend::UtxoBackend;
use crate::store::UtxoStore;
use shared_types::Address;

fn owner(byte: u8) -> Address {
    Address([byte; 20])
}

pub(crate) fn add_then_get<B: UtxoBackend>(store: UtxoStore<B>) {
    assert!(store.add(owner(1), [1; 32], 0, 100, SpendCondition::Owner).unwrap());
    let utxo = store.get(&[1; 32], 0).unwrap().unwrap();
    assert_eq!(utxo.owner, owner(1));
    assert_eq!(utxo.amount, 100);
    assert!(!utxo.spent);
    assert_eq!(store.get(&[1; 32], 1).unwrap(), None);
}

pub(crate) fn duplicate_add_is_noop<B: UtxoBackend>(store: UtxoStore<B>) {
    assert!(store.add(owner(1), [1; 32], 0, 100, SpendCondition::Owner).unwrap());
    assert!(!store.add(owner(2), [1; 32], 0, 999, SpendCondition::Owner).unwrap());

    let utxo = store.get(&[1; 32], 0).unwrap().unwrap();
    assert_eq!((utxo.owner, utxo.amount), (owner(1), 100));
    assert_eq!(store.unspent_count(), 1);
}

pub(crate) fn spend_once<B: UtxoBackend>(store: UtxoStore<B>) {
    store.add(owner(1), [2; 32], 0, 50, SpendCondition::Owner).unwrap();

    assert!(store.mark_spent(&[2; 32], 0).unwrap());
    assert!(!store.mark_spent(&[2; 32], 0).unwrap(), "double spend");
    assert!(!store.mark_spent(&[3; 32], 0).unwrap(), "unknown key");

    assert_eq!(store.get(&[2; 32], 0).unwrap(), None);
    let retained = store.entry(&shared_types::OutPoint::new([2; 32], 0)).unwrap();
    assert!(retained.is_some_and(|u| u.spent), "spent entries are kept");
    assert_eq!(store.unspent_count(), 0);
}

pub(crate) fn spent_key_cannot_be_re_added<B: UtxoBackend>(store: UtxoStore<B>) {
    store.add(owner(1), [4; 32], 0, 50, SpendCondition::Owner).unwrap();
    store.mark_spent(&[4; 32], 0).unwrap();
    assert!(!store.add(owner(1), [4; 32], 0, 50, SpendCondition::Owner).unwrap());
    assert_eq!(store.get(&[4; 32], 0).unwrap(), None);
}

pub(crate) fn balance_and_listing<B: UtxoBackend>(store: UtxoStore<B>) {
    store.add(owner(1), [1; 32], 0, 30, SpendCondition::Owner).unwrap();
    store.add(owner(1), [1; 32], 1, 70, SpendCondition::Owner).unwrap();
    store.add(owner(2), [1; 32], 2, 5, SpendCondition::Owner).unwrap();
    store.mark_spent(&[1; 32], 0).unwrap();

    assert_eq!(store.balance(&owner(1)).unwrap(), 70);
    assert_eq!(store.balance(&owner(2)).unwrap(), 5);
    assert_eq!(store.balance(&owner(3)).unwrap(), 0);

    let listed = store.list_for(&owner(1)).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].output_index(), 1);
    assert_eq!(store.unspent_total(), 75);
}

pub(crate) fn digest_tracks_spent_flag<B: UtxoBackend>(store: UtxoStore<B>) {
    store.add(owner(1), [6; 32], 0, 10, SpendCondition::Owner).unwrap();
    let before = store.digest().unwrap();
    store.mark_spent(&[6; 32], 0).unwrap();
    assert_ne!(store.digest().unwrap(), before);
}

pub(crate) fn export_import_restores_state<B: UtxoBackend>(store: UtxoStore<B>) {
    store.add(owner(1), [8; 32], 0, 10, SpendCondition::Owner).unwrap();
    store
        .add(
            owner(2),
            [8; 32],
            1,
            20,
            SpendCondition::LockedUntil {
                lock_id: "grant".into(),
                unlock_time: 500,
            },
        )
        .unwrap();
    let snapshot = store.export().unwrap();
    let digest = store.digest().unwrap();

    store.mark_spent(&[8; 32], 0).unwrap();
    store.add(owner(3), [9; 32], 0, 1, SpendCondition::Owner).unwrap();
    assert_ne!(store.digest().unwrap(), digest);

    store.import(snapshot).unwrap();
    assert_eq!(store.digest().unwrap(), digest);
    assert_eq!(store.unspent_count(), 2);
    assert_eq!(store.balance(&owner(3)).unwrap(), 0);
    assert_eq!(store.list_for(&owner(2)).unwrap().len(), 1);
}

macro_rules! backend_contract {
    ($module:ident, $make:expr) => {
        mod $module {
            use super::*;

            #[test]
            fn test_add_then_get() {
                let (store, _guard) = $make;
                add_then_get(store);
            }

            #[test]
            fn test_duplicate_add_is_noop() {
                let (store, _guard) = $make;
                duplicate_add_is_noop(store);
            }

            #[test]
            fn test_spend_once() {
                let (store, _guard) = $make;
                spend_once(store);
            }

            #[test]
            fn test_spent_key_cannot_be_re_added() {
                let (store, _guard) = $make;
                spent_key_cannot_be_re_added(store);
            }

            #[test]
            fn test_balance_and_listing() {
                let (store, _guard) = $make;
                balance_and_listing(store);
            }

            #[test]
            fn test_digest_tracks_spent_flag() {
                let (store, _guard) = $make;
                digest_tracks_spent_flag(store);
            }

            #[test]
            fn test_export_import_restores_state() {
                let (store, _guard) = $make;
                export_import_restores_state(store);
            }
        }
    };
}

backend_contract!(
    memory,
    (
        UtxoStore::new(crate::adapters::MemoryBackend::new()).unwrap(),
        ()
    )
);

#[cfg(feature = "rocksdb")]
backend_contract!(rocksdb_backend, {
    let dir = tempfile::TempDir::new().unwrap();
    let backend = crate::adapters::RocksDbBackend::open(dir.path(), false).unwrap();
    (UtxoStore::new(backend).unwrap(), dir)
});

fn shared_history<B: UtxoBackend>(store: &UtxoStore<B>) {
    store.add(owner(1), [1; 32], 0, 10, SpendCondition::Owner).unwrap();
    store.add(owner(2), [1; 32], 1, 20, SpendCondition::Owner).unwrap();
    store.mark_spent(&[1; 32], 0).unwrap();
}

#[cfg(feature = "rocksdb")]
#[test]
fn test_backends_agree_on_digest() {
    let dir = tempfile::TempDir::new().unwrap();
    let memory = UtxoStore::new(crate::adapters::MemoryBackend::new()).unwrap();
    let disk =
        UtxoStore::new(crate::adapters::RocksDbBackend::open(dir.path(), false).unwrap()).unwrap();
    shared_history(&memory);
    shared_history(&disk);
    assert_eq!(memory.digest().unwrap(), disk.digest().unwrap());
}

#[test]
fn test_boxed_backend_behaves_like_concrete() {
    let boxed: UtxoStore =
        UtxoStore::new(crate::adapters::open_backend(&Default::default()).unwrap()).unwrap();
    let concrete = UtxoStore::new(crate::adapters::MemoryBackend::new()).unwrap();
    shared_history(&boxed);
    shared_history(&concrete);
    assert_eq!(boxed.digest().unwrap(), concrete.digest().unwrap());
    assert_eq!(boxed.backend_name(), "memory");
}
