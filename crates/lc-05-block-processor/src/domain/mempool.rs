//! # Mempool
//!
//! Validated transactions waiting for a block, in arrival order.
//!
//! ## Admission Rules
//!
//! - At most `max_transactions` entries
//! - No duplicate ids
//! - One pending transaction per `(sender, nonce)`
//! - No two pending transactions consume the same outpoint
//!
//! Validation against chain state happens before `insert`; the pool only
//! enforces rules between pending entries.

use super::errors::AdmissionError;
use shared_types::{Address, Hash, OutPoint, Transaction};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MempoolConfig {
    pub max_transactions: usize,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
        }
    }
}

/// Pending transactions with indices for the admission rules.
#[derive(Debug, Default)]
pub struct Mempool {
    config: MempoolConfig,
    /// Arrival order. Every entry has `id` set.
    pending: Vec<Transaction>,
    by_id: HashMap<Hash, usize>,
    by_sender_nonce: HashMap<(Address, u64), Hash>,
    claimed: HashMap<OutPoint, Hash>,
}

impl Mempool {
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &MempoolConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn get(&self, id: &Hash) -> Option<&Transaction> {
        self.by_id.get(id).map(|&i| &self.pending[i])
    }

    /// Pending transactions in arrival order.
    pub fn transactions(&self) -> &[Transaction] {
        &self.pending
    }

    /// Add an already validated transaction. Returns its id.
    pub fn insert(&mut self, mut tx: Transaction) -> Result<Hash, AdmissionError> {
        let id = tx.ensure_id();
        if self.by_id.contains_key(&id) {
            return Err(AdmissionError::Duplicate(id));
        }
        if self.pending.len() >= self.config.max_transactions {
            return Err(AdmissionError::PoolFull {
                capacity: self.config.max_transactions,
            });
        }
        if self.by_sender_nonce.contains_key(&(tx.sender, tx.nonce)) {
            return Err(AdmissionError::NonceTaken {
                sender: tx.sender,
                nonce: tx.nonce,
            });
        }
        if let Some((outpoint, &claimed_by)) = tx
            .outpoints()
            .find_map(|op| self.claimed.get(&op).map(|by| (op, by)))
        {
            return Err(AdmissionError::OutpointClaimed {
                outpoint,
                claimed_by,
            });
        }

        self.index(&tx, id, self.pending.len());
        self.pending.push(tx);
        Ok(id)
    }

    /// Drop everything a committed block made obsolete: the block's own
    /// transactions, pending entries whose `(sender, nonce)` the block used,
    /// and pending entries spending an outpoint the block spent.
    ///
    /// Returns the number of entries removed.
    pub fn remove_committed(&mut self, committed: &[Transaction]) -> usize {
        if self.pending.is_empty() || committed.is_empty() {
            return 0;
        }
        let ids: HashSet<Hash> =
            committed.iter().map(Transaction::id_or_compute).collect();
        let slots: HashSet<(Address, u64)> =
            committed.iter().map(|tx| (tx.sender, tx.nonce)).collect();
        let spent: HashSet<OutPoint> =
            committed.iter().flat_map(Transaction::outpoints).collect();

        let before = self.pending.len();
        let kept: Vec<Transaction> = std::mem::take(&mut self.pending)
            .into_iter()
            .filter(|tx| {
                !ids.contains(&tx.id_or_compute())
                    && !slots.contains(&(tx.sender, tx.nonce))
                    && !tx.outpoints().any(|op| spent.contains(&op))
            })
            .collect();
        self.rebuild(kept);
        before - self.pending.len()
    }

    /// Copy of the pending list for rollback or persistence.
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.pending.clone()
    }

    /// Replace the pending list wholesale. Entries are trusted.
    pub fn restore(&mut self, transactions: Vec<Transaction>) {
        self.rebuild(transactions);
    }

    fn rebuild(&mut self, transactions: Vec<Transaction>) {
        self.by_id.clear();
        self.by_sender_nonce.clear();
        self.claimed.clear();
        let mut pending = transactions;
        for (position, tx) in pending.iter_mut().enumerate() {
            let id = tx.ensure_id();
            self.index(tx, id, position);
        }
        self.pending = pending;
    }

    fn index(&mut self, tx: &Transaction, id: Hash, position: usize) {
        self.by_id.insert(id, position);
        self.by_sender_nonce.insert((tx.sender, tx.nonce), id);
        for outpoint in tx.outpoints() {
            self.claimed.insert(outpoint, id);
        }
    }
}
