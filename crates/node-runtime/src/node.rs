//! # Node Boot and Recovery
//!
//! Builds a [`Ledger`] on top of the durable state store and brings it back
//! to the last committed state.
//!
//! | `load()` outcome | Boot result |
//! |------------------|-------------|
//! | state from primary / backup / checkpoint | restored, source reported |
//! | state from an unverified legacy backup | restored, warning logged |
//! | `NoState` (fresh data directory) | empty ledger |
//! | `Unrecoverable` | refuse to start |

use crate::config::NodeConfig;
use lc_02_utxo_store::{open_backend, DynBackend, UtxoError, UtxoStore};
use lc_03_state_store::{DurableStateStore, LoadError, PersistenceError, StateSource};
use lc_05_block_processor::{ChainStateSnapshot, Ledger, TransactionIndex};
use shared_types::ChainTip;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// The ledger as the node runs it: durable state, runtime-selected backend.
pub type NodeLedger = Ledger<DurableStateStore, DynBackend>;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("failed to open state store: {0}")]
    Store(#[source] PersistenceError),

    #[error("failed to open UTXO backend: {0}")]
    Backend(#[source] UtxoError),

    #[error("persisted state could not be loaded: {0}")]
    Load(#[source] LoadError),

    #[error("failed to restore ledger from snapshot: {0}")]
    Restore(#[source] UtxoError),
}

/// Where the starting state came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootSource {
    /// No state files existed.
    Fresh,
    Recovered(StateSource),
}

impl std::fmt::Display for BootSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootSource::Fresh => write!(f, "fresh data directory"),
            BootSource::Recovered(source) => write!(f, "{}", source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootReport {
    pub source: BootSource,
    pub tip: Option<ChainTip>,
    pub backend: &'static str,
}

impl BootReport {
    /// True when the state was trusted without a checksum.
    pub fn is_unverified(&self) -> bool {
        matches!(
            &self.source,
            BootSource::Recovered(source) if !source.is_verified()
        )
    }
}

/// A booted node.
pub struct Node {
    ledger: NodeLedger,
    index: Arc<TransactionIndex>,
    report: BootReport,
}

impl Node {
    pub fn boot(config: &NodeConfig) -> Result<Self, BootError> {
        let store = DurableStateStore::open(config.storage.clone()).map_err(BootError::Store)?;
        let backend = open_backend(&config.utxo_backend).map_err(BootError::Backend)?;
        let utxos = UtxoStore::new(backend).map_err(BootError::Backend)?;
        let backend_name = utxos.backend_name();

        let loaded = match store.load::<ChainStateSnapshot>() {
            Ok(loaded) => Some(loaded),
            Err(LoadError::NoState) => None,
            Err(e) => return Err(BootError::Load(e)),
        };

        let index = Arc::new(TransactionIndex::new());
        let ledger = Ledger::new(config.ledger(), utxos, store).with_hook(Arc::clone(&index));

        let source = match loaded {
            Some(loaded) => {
                if !loaded.source.is_verified() {
                    warn!(
                        source = %loaded.source,
                        height = loaded.metadata.height,
                        "starting from state that carried no checksum"
                    );
                }
                ledger
                    .restore_snapshot(loaded.snapshot)
                    .map_err(BootError::Restore)?;
                BootSource::Recovered(loaded.source)
            }
            None => {
                clear_leftover_utxos(&ledger).map_err(BootError::Restore)?;
                BootSource::Fresh
            }
        };

        let report = BootReport {
            source,
            tip: ledger.tip(),
            backend: backend_name,
        };
        info!(
            source = %report.source,
            height = ?report.tip.map(|t| t.height),
            backend = report.backend,
            "node booted"
        );

        Ok(Self {
            ledger,
            index,
            report,
        })
    }

    pub fn ledger(&self) -> &NodeLedger {
        &self.ledger
    }

    pub fn store(&self) -> &DurableStateStore {
        self.ledger.sink()
    }

    pub fn index(&self) -> &TransactionIndex {
        &self.index
    }

    pub fn report(&self) -> &BootReport {
        &self.report
    }
}

/// Empty a backend that still holds entries, spent or not, when no state
/// file exists. Returns whether anything was cleared.
fn clear_leftover_utxos(ledger: &NodeLedger) -> Result<bool, UtxoError> {
    let leftover = ledger.snapshot()?;
    if leftover.utxos.entries.is_empty() {
        return Ok(false);
    }
    warn!(
        entries = leftover.utxos.entries.len(),
        unspent = leftover.utxos.unspent_count,
        "UTXO backend holds entries but no state file exists; clearing"
    );
    ledger.restore_snapshot(ChainStateSnapshot::empty())?;
    Ok(true)
}
