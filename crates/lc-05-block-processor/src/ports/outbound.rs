//! # Outbound Ports
//!
//! `StateSink` is the atomicity boundary: a commit counts once `persist`
//! returns `Ok`. Everything a `PostCommitHook` does happens afterwards and
//! is best effort.

use crate::domain::errors::HookError;
use crate::domain::snapshot::ChainStateSnapshot;
use lc_03_state_store::PersistenceError;
use shared_types::Block;

/// Durable storage for chain state.
pub trait StateSink: Send + Sync {
    /// Write `snapshot` so that it survives a crash, or fail without
    /// changing what is on disk.
    fn persist(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError>;

    /// Whether the block at `height` should also produce a checkpoint.
    fn checkpoint_due(&self, height: u64) -> bool;

    fn write_checkpoint(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError>;
}

/// Side effect run after a block is durably committed.
pub trait PostCommitHook: Send + Sync {
    fn name(&self) -> &'static str;

    fn on_commit(&self, block: &Block) -> Result<(), HookError>;
}

impl<S: StateSink + ?Sized> StateSink for std::sync::Arc<S> {
    fn persist(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        (**self).persist(snapshot)
    }

    fn checkpoint_due(&self, height: u64) -> bool {
        (**self).checkpoint_due(height)
    }

    fn write_checkpoint(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        (**self).write_checkpoint(snapshot)
    }
}

impl<H: PostCommitHook + ?Sized> PostCommitHook for std::sync::Arc<H> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn on_commit(&self, block: &Block) -> Result<(), HookError> {
        (**self).on_commit(block)
    }
}
