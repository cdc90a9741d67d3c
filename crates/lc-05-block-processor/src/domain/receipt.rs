//! Results handed back to callers of `commit` and `submit_block`.

use super::orphans::OrphanStatus;
use serde::Serialize;
use serde_with::{hex::Hex, serde_as};
use shared_types::{Address, Amount, Hash};
use std::collections::BTreeMap;

/// A block that made it to disk.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReceipt {
    pub height: u64,
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    pub tx_count: usize,
    /// Post-commit balance of every sender and output owner in the block.
    pub balances: BTreeMap<Address, Amount>,
}

/// What `submit_block` did with a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// The block extended the tip. `promoted` lists orphans committed on top
    /// of it, `pruned` the number of stale orphans dropped afterwards.
    Committed {
        receipt: CommitReceipt,
        promoted: Vec<CommitReceipt>,
        pruned: usize,
    },
    /// The block is ahead of the tip and waits for its parent.
    Orphaned { height: u64, status: OrphanStatus },
}

impl BlockOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, BlockOutcome::Committed { .. })
    }

    /// Height of the highest block this call committed, if any.
    pub fn committed_height(&self) -> Option<u64> {
        match self {
            BlockOutcome::Committed {
                receipt, promoted, ..
            } => Some(promoted.last().unwrap_or(receipt).height),
            BlockOutcome::Orphaned { .. } => None,
        }
    }
}
