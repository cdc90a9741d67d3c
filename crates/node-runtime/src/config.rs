//! # Node Configuration
//!
//! Defaults for every component, overridable from `LC_*` environment
//! variables. A malformed value is logged and the default kept; startup never
//! fails on configuration alone.
//!
//! | Variable | Field |
//! |----------|-------|
//! | `LC_DATA_DIR` | `storage.data_dir` (RocksDB lives in `<data_dir>/utxo`) |
//! | `LC_UTXO_BACKEND` | `memory` or `rocksdb` |
//! | `LC_BACKUP_RETENTION` | `storage.backup_retention` |
//! | `LC_CHECKPOINT_INTERVAL` | `storage.checkpoint_interval` |
//! | `LC_CHECKPOINT_RETENTION` | `storage.checkpoint_retention` |
//! | `LC_CLOCK_SKEW_SECS` | `validation.max_clock_skew_secs` |
//! | `LC_MEMPOOL_CAPACITY` | `mempool.max_transactions` |
//! | `LC_ORPHAN_RETENTION` | `orphans.retention` |

use lc_02_utxo_store::BackendConfig;
use lc_03_state_store::StateStoreConfig;
use lc_04_tx_validation::ValidationConfig;
use lc_05_block_processor::{LedgerConfig, MempoolConfig, OrphanConfig};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Directory under `data_dir` holding the RocksDB UTXO database.
pub const UTXO_DB_DIR: &str = "utxo";

/// Complete node configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeConfig {
    pub storage: StateStoreConfig,
    pub utxo_backend: BackendConfig,
    pub validation: ValidationConfig,
    pub mempool: MempoolConfig,
    pub orphans: OrphanConfig,
}

/// Which UTXO engine the environment asked for, before paths are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackendKind {
    Memory,
    RocksDb,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(BackendKind::Memory),
            "rocksdb" | "rocks" => Ok(BackendKind::RocksDb),
            other => Err(format!("unknown backend {other:?}")),
        }
    }
}

impl NodeConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with overrides from `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = NodeConfig::default();

        if let Some(dir) = lookup("LC_DATA_DIR").filter(|d| !d.trim().is_empty()) {
            config.storage.data_dir = PathBuf::from(dir);
        }
        override_parsed(&lookup, "LC_BACKUP_RETENTION", &mut config.storage.backup_retention);
        override_parsed(
            &lookup,
            "LC_CHECKPOINT_INTERVAL",
            &mut config.storage.checkpoint_interval,
        );
        override_parsed(
            &lookup,
            "LC_CHECKPOINT_RETENTION",
            &mut config.storage.checkpoint_retention,
        );
        override_parsed(
            &lookup,
            "LC_CLOCK_SKEW_SECS",
            &mut config.validation.max_clock_skew_secs,
        );
        override_parsed(
            &lookup,
            "LC_MEMPOOL_CAPACITY",
            &mut config.mempool.max_transactions,
        );
        override_parsed(&lookup, "LC_ORPHAN_RETENTION", &mut config.orphans.retention);

        let mut backend = BackendKind::Memory;
        override_parsed(&lookup, "LC_UTXO_BACKEND", &mut backend);
        // Resolved last so the database follows LC_DATA_DIR.
        config.utxo_backend = match backend {
            BackendKind::Memory => BackendConfig::Memory,
            BackendKind::RocksDb => BackendConfig::RocksDb {
                path: config.storage.data_dir.join(UTXO_DB_DIR),
                sync_writes: config.storage.sync_writes,
            },
        };

        config
    }

    /// The part of the configuration the ledger itself consumes.
    pub fn ledger(&self) -> LedgerConfig {
        LedgerConfig {
            validation: self.validation,
            mempool: self.mempool,
            orphans: self.orphans,
        }
    }
}

fn override_parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut T)
where
    T: FromStr + std::fmt::Debug,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => {
            info!(key, value = ?value, "configuration override");
            *target = value;
        }
        Err(e) => warn!(key, value = %raw, error = %e, "ignoring malformed configuration value"),
    }
}
