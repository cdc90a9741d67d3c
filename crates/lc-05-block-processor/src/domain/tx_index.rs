//! # Transaction Index
//!
//! Maps committed transaction ids to their block height and position. Runs
//! as a post-commit hook, so a failure here never affects a commit.

use crate::domain::errors::HookError;
use crate::ports::outbound::PostCommitHook;
use parking_lot::RwLock;
use shared_types::{Block, Hash};
use std::collections::HashMap;

/// Where a committed transaction lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLocation {
    pub height: u64,
    pub position: usize,
}

#[derive(Debug, Default)]
pub struct TransactionIndex {
    locations: RwLock<HashMap<Hash, TxLocation>>,
}

impl TransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn locate(&self, tx_id: &Hash) -> Option<TxLocation> {
        self.locations.read().get(tx_id).copied()
    }

    pub fn len(&self) -> usize {
        self.locations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.read().is_empty()
    }
}

impl PostCommitHook for TransactionIndex {
    fn name(&self) -> &'static str {
        "transaction-index"
    }

    fn on_commit(&self, block: &Block) -> Result<(), HookError> {
        let mut locations = self.locations.write();
        for (position, tx) in block.transactions.iter().enumerate() {
            let id = tx.id.ok_or_else(|| {
                HookError(format!(
                    "transaction {} in block {} has no id",
                    position, block.height
                ))
            })?;
            locations.insert(
                id,
                TxLocation {
                    height: block.height,
                    position,
                },
            );
        }
        tracing::trace!(
            height = block.height,
            indexed = block.transactions.len(),
            "transactions indexed"
        );
        Ok(())
    }
}
