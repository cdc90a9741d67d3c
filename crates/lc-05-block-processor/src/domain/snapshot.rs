//! The unit of persistence and rollback.

use lc_01_nonce_tracker::NonceSnapshot;
use lc_02_utxo_store::{UtxoExport, EXPORT_VERSION};
use lc_03_state_store::StateSnapshot;
use serde::{Deserialize, Serialize};
use shared_types::{ChainTip, Transaction};

/// Full chain state: UTXO set, nonce counters, mempool and tip.
///
/// Blocks themselves are not part of it; a restarted node resumes from the
/// tip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStateSnapshot {
    /// `None` before the first block.
    pub tip: Option<ChainTip>,
    pub utxos: UtxoExport,
    pub nonces: NonceSnapshot,
    pub mempool: Vec<Transaction>,
}

impl ChainStateSnapshot {
    /// State before the first block.
    pub fn empty() -> Self {
        Self {
            tip: None,
            utxos: UtxoExport {
                version: EXPORT_VERSION,
                ..Default::default()
            },
            nonces: NonceSnapshot::default(),
            mempool: Vec::new(),
        }
    }
}

impl StateSnapshot for ChainStateSnapshot {
    fn height(&self) -> u64 {
        self.tip.map_or(0, |tip| tip.height)
    }
}
