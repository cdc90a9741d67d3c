//! # Outbound Ports
//!
//! Read-only views the validator needs. Implementations must answer from a
//! single consistent state for the duration of one `validate` call; the
//! commit path guarantees this by holding its lock.

use lc_02_utxo_store::{Utxo, UtxoError};
use shared_types::{Address, OutPoint, Timestamp};

/// Lookup of spendable outputs.
pub trait UtxoView {
    /// The output at `outpoint` if it exists and is unspent.
    fn unspent(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError>;
}

/// Lookup of replay-protection counters.
pub trait NonceView {
    /// The only nonce `account` may use next, `None` once its counter is exhausted.
    fn next_nonce(&self, account: &Address) -> Option<u64>;
}

/// Wall clock in Unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> Timestamp;
}

impl<V: UtxoView + ?Sized> UtxoView for &V {
    fn unspent(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        (**self).unspent(outpoint)
    }
}

impl<V: NonceView + ?Sized> NonceView for &V {
    fn next_nonce(&self, account: &Address) -> Option<u64> {
        (**self).next_nonce(account)
    }
}
