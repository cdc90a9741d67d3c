//! # Durable State Store (lc-03)
//!
//! Persists a full snapshot of ledger state so a restarted node resumes
//! exactly where it stopped, and recovers from a damaged state file using
//! rolling backups and periodic checkpoints.
//!
//! ## On-Disk Layout
//!
//! ```text
//! <data_dir>/
//! ├── LOCK                         exclusive advisory lock (fs2)
//! ├── state.json                   primary file
//! ├── backups/state_<utc>_<seq>_h<height>.json
//! └── checkpoints/checkpoint_<height>.json
//! ```
//!
//! Every file has the same envelope:
//! `{ "metadata": { timestamp, height, checksum, version }, "state": ... }`.
//! The checksum is SHA-256 over the canonical JSON encoding of `state`.
//!
//! ## Write Protocol
//!
//! 1. Serialize to `<file>.tmp`, `fsync`
//! 2. Copy the current primary into `backups/` and prune beyond retention
//! 3. `rename` the temporary file over the primary, `fsync` the directory
//!
//! ## Recovery Order
//!
//! primary → newest backup → … → newest checkpoint → … → explicit failure.
//! A backup without a checksum (legacy layout) is accepted but reported as
//! [`StateSource::UnverifiedBackup`]. No path ever fabricates an empty state
//! when files exist but none are usable.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod store;

pub use adapters::checksum::Sha256Checksum;
pub use adapters::lock::DirectoryLock;
pub use adapters::time::SystemTimeSource;
pub use domain::envelope::{
    LoadedState, StateEnvelope, StateMetadata, StateSnapshot, StateSource, FORMAT_VERSION,
};
pub use domain::errors::{CorruptionError, LoadError, LockError, PersistenceError, RecoveryAttempt};
pub use ports::outbound::{ChecksumProvider, TimeSource};
pub use store::{DurableStateStore, StateStoreConfig};
