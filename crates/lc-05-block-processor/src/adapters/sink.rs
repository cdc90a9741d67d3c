//! `StateSink` implementations.

use crate::domain::snapshot::ChainStateSnapshot;
use crate::ports::outbound::StateSink;
use lc_03_state_store::{
    ChecksumProvider, DurableStateStore, PersistenceError, StateSnapshot, TimeSource,
};
use parking_lot::Mutex;

impl<C: ChecksumProvider, T: TimeSource> StateSink for DurableStateStore<C, T> {
    fn persist(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        DurableStateStore::persist(self, snapshot)
    }

    fn checkpoint_due(&self, height: u64) -> bool {
        DurableStateStore::checkpoint_due(self, height)
    }

    fn write_checkpoint(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        DurableStateStore::write_checkpoint(self, snapshot).map(|_| ())
    }
}

/// Keeps the last persisted snapshot in memory. For nodes that run without
/// a data directory, and for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    last: Mutex<Option<ChainStateSnapshot>>,
    checkpoints: Mutex<Vec<u64>>,
    checkpoint_interval: u64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a checkpoint height every `interval` blocks.
    pub fn with_checkpoint_interval(interval: u64) -> Self {
        Self {
            checkpoint_interval: interval,
            ..Default::default()
        }
    }

    pub fn last(&self) -> Option<ChainStateSnapshot> {
        self.last.lock().clone()
    }

    /// Heights at which checkpoints were written.
    pub fn checkpoints(&self) -> Vec<u64> {
        self.checkpoints.lock().clone()
    }
}

impl StateSink for MemorySink {
    fn persist(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        *self.last.lock() = Some(snapshot.clone());
        Ok(())
    }

    fn checkpoint_due(&self, height: u64) -> bool {
        self.checkpoint_interval > 0 && height > 0 && height % self.checkpoint_interval == 0
    }

    fn write_checkpoint(&self, snapshot: &ChainStateSnapshot) -> Result<(), PersistenceError> {
        self.checkpoints.lock().push(snapshot.height());
        Ok(())
    }
}
