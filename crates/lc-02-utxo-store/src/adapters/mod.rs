//! # Adapters Layer
//!
//! - `memory` - in-process `BTreeMap` backend (tests, ephemeral nodes)
//! - `rocksdb` - embedded on-disk backend (feature `rocksdb`)

pub mod memory;
#[cfg(feature = "rocksdb")]
pub mod rocksdb;

pub use memory::MemoryBackend;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::RocksDbBackend;

use crate::domain::errors::UtxoError;
use crate::ports::backend::UtxoBackend;
use std::path::PathBuf;

/// Backend chosen at runtime from configuration.
pub type DynBackend = Box<dyn UtxoBackend>;

/// Which engine holds the unspent-output set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackendConfig {
    #[default]
    Memory,
    RocksDb {
        path: PathBuf,
        /// fsync every write batch.
        sync_writes: bool,
    },
}

/// Open the configured backend.
///
/// Asking for RocksDB in a build without the `rocksdb` feature is an error
/// rather than a silent fallback to memory.
pub fn open_backend(config: &BackendConfig) -> Result<DynBackend, UtxoError> {
    match config {
        BackendConfig::Memory => Ok(Box::new(MemoryBackend::new())),
        #[cfg(feature = "rocksdb")]
        BackendConfig::RocksDb { path, sync_writes } => {
            Ok(Box::new(RocksDbBackend::open(path, *sync_writes)?))
        }
        #[cfg(not(feature = "rocksdb"))]
        BackendConfig::RocksDb { .. } => Err(UtxoError::BackendUnavailable("rocksdb")),
    }
}
