//! # Orphan Pool
//!
//! Blocks that arrived before their parent, bucketed by height.

use shared_types::{Block, Hash};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrphanConfig {
    /// Buckets more than this many blocks behind the tip are pruned.
    pub retention: u64,
    /// Hard cap on held blocks across all buckets.
    pub max_blocks: usize,
}

impl Default for OrphanConfig {
    fn default() -> Self {
        Self {
            retention: 100,
            max_blocks: 1024,
        }
    }
}

/// What `insert` did with a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanStatus {
    Held,
    AlreadyHeld,
    /// The pool is at `max_blocks`; the block was dropped.
    PoolFull,
}

#[derive(Debug, Default)]
pub struct OrphanPool {
    config: OrphanConfig,
    buckets: BTreeMap<u64, Vec<Block>>,
    count: usize,
}

impl OrphanPool {
    pub fn new(config: OrphanConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &OrphanConfig {
        &self.config
    }

    /// Number of held blocks.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Heights that currently hold at least one block, ascending.
    pub fn heights(&self) -> Vec<u64> {
        self.buckets.keys().copied().collect()
    }

    pub fn contains(&self, height: u64, hash: &Hash) -> bool {
        self.buckets
            .get(&height)
            .is_some_and(|bucket| bucket.iter().any(|b| &b.hash == hash))
    }

    pub fn insert(&mut self, block: Block) -> OrphanStatus {
        if self.contains(block.height, &block.hash) {
            return OrphanStatus::AlreadyHeld;
        }
        if self.count >= self.config.max_blocks {
            return OrphanStatus::PoolFull;
        }
        self.buckets.entry(block.height).or_default().push(block);
        self.count += 1;
        OrphanStatus::Held
    }

    /// Remove and return every block at `height` whose parent is `parent`,
    /// in arrival order. Siblings with another parent stay held.
    pub fn take_children(&mut self, height: u64, parent: &Hash) -> Vec<Block> {
        let Some(bucket) = self.buckets.remove(&height) else {
            return Vec::new();
        };
        let (children, rest): (Vec<Block>, Vec<Block>) = bucket
            .into_iter()
            .partition(|b| &b.previous_hash == parent);
        if !rest.is_empty() {
            self.buckets.insert(height, rest);
        }
        self.count -= children.len();
        children
    }

    /// Drop buckets more than `retention` blocks below `tip_height`.
    /// Returns the number of blocks dropped.
    pub fn prune(&mut self, tip_height: u64, retention: u64) -> usize {
        let cutoff = tip_height.saturating_sub(retention);
        // Heights strictly below `cutoff` are more than `retention` behind.
        let keep = self.buckets.split_off(&cutoff);
        let dropped: usize = std::mem::replace(&mut self.buckets, keep)
            .values()
            .map(Vec::len)
            .sum();
        self.count -= dropped;
        dropped
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.count = 0;
    }
}
