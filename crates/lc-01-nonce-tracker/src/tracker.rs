//! # Nonce Tracker
//!
//! The counter map lives behind a single mutex. Reads are cheap and the map
//! is small, so there is no read/write split.

use crate::errors::NonceError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_types::Address;
use std::collections::{BTreeMap, HashMap};

/// Point-in-time copy of every counter.
///
/// Ordered by address so two snapshots of equal state compare and serialize
/// identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NonceSnapshot(BTreeMap<Address, u64>);

impl NonceSnapshot {
    pub fn get(&self, account: &Address) -> Option<u64> {
        self.0.get(account).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<Address, u64> {
        self.0
    }
}

impl From<BTreeMap<Address, u64>> for NonceSnapshot {
    fn from(map: BTreeMap<Address, u64>) -> Self {
        Self(map)
    }
}

/// Replay-protection counters, one per account.
///
/// An unseen account has counter `0`, so its first transaction carries
/// nonce `1`.
#[derive(Debug, Default)]
pub struct NonceTracker {
    counters: Mutex<HashMap<Address, u64>>,
}

impl NonceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tracker from persisted counters, trusting them as-is.
    pub fn from_snapshot(snapshot: NonceSnapshot) -> Self {
        Self {
            counters: Mutex::new(snapshot.0.into_iter().collect()),
        }
    }

    /// Last committed nonce for `account`, `0` if never seen.
    pub fn current(&self, account: &Address) -> u64 {
        self.counters.lock().get(account).copied().unwrap_or(0)
    }

    /// `current + 1`, saturating at `u64::MAX`.
    ///
    /// For admission decisions use [`validate`](Self::validate) or
    /// [`checked_next`](Self::checked_next): a saturated value is not a usable nonce.
    pub fn next_expected(&self, account: &Address) -> u64 {
        self.current(account).saturating_add(1)
    }

    /// The only nonce `account` may still use, `None` once the counter is exhausted.
    pub fn checked_next(&self, account: &Address) -> Option<u64> {
        self.current(account).checked_add(1)
    }

    /// True iff `nonce` is exactly the successor of the committed value.
    ///
    /// Rejects both reuse (`nonce <= current`) and gaps (`nonce > current + 1`).
    pub fn validate(&self, account: &Address, nonce: u64) -> bool {
        self.checked_next(account) == Some(nonce)
    }

    /// Set the counter to `nonce`. Only the commit path calls this.
    pub fn advance(&self, account: &Address, nonce: u64) -> Result<(), NonceError> {
        let mut counters = self.counters.lock();
        let current = counters.get(account).copied().unwrap_or(0);
        if nonce < current {
            return Err(NonceError::Regression {
                account: *account,
                current,
                requested: nonce,
            });
        }
        counters.insert(*account, nonce);
        tracing::trace!(%account, nonce, "nonce advanced");
        Ok(())
    }

    /// Copy of the full map for rollback or persistence.
    pub fn snapshot(&self) -> NonceSnapshot {
        NonceSnapshot(
            self.counters
                .lock()
                .iter()
                .map(|(account, nonce)| (*account, *nonce))
                .collect(),
        )
    }

    /// Replace the whole map with `snapshot`.
    pub fn restore(&self, snapshot: NonceSnapshot) {
        *self.counters.lock() = snapshot.0.into_iter().collect();
    }

    /// Number of accounts with a recorded counter.
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}
