//! # Unspent-Output Store (lc-02)
//!
//! The authoritative record of spendable value per account.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Unique key | `add()` refuses an existing `(tx_id, index)` |
//! | 2 | Spend once | `mark_spent()` flips unspent→spent exactly once |
//! | 3 | Never deleted | Spent entries stay in the backend for audit/export |
//! | 4 | Order-free digest | `digest()` hashes entries sorted by key |
//! | 5 | Derived counters | `import()` recomputes counts, never trusts stored aggregates |
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - `Utxo`, `SpendCondition`, `UtxoExport`, `UtxoError`
//! - `ports/` - `UtxoBackend` trait
//! - `adapters/` - `MemoryBackend`, `RocksDbBackend` (feature `rocksdb`)
//! - `store.rs` - `UtxoStore`, the locked facade used by the rest of the node
//!
//! ## Usage
//!
//! ```ignore
//! use lc_02_utxo_store::{MemoryBackend, SpendCondition, UtxoStore};
//!
//! let store = UtxoStore::new(MemoryBackend::new())?;
//! store.add(owner, tx_id, 0, 100, SpendCondition::Owner)?;
//! assert_eq!(store.balance(&owner)?, 100);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod store;

#[cfg(test)]
mod contract;

pub use adapters::{open_backend, BackendConfig, DynBackend, MemoryBackend};
#[cfg(feature = "rocksdb")]
pub use adapters::RocksDbBackend;
pub use domain::entities::{SpendCondition, Utxo, UtxoExport, EXPORT_VERSION};
pub use domain::errors::UtxoError;
pub use ports::backend::UtxoBackend;
pub use store::UtxoStore;
