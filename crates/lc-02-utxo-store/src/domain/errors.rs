//! # UTXO Store Errors

use shared_types::{Address, OutPoint};
use thiserror::Error;

/// Errors raised by the store or one of its backends.
///
/// Duplicate adds and double spends are not errors: `add` and `mark_spent`
/// report them through their `bool` result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtxoError {
    /// The storage engine failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt entry {key}: {message}")]
    CorruptEntry { key: String, message: String },

    /// An import listed the same outpoint twice.
    #[error("duplicate entry in import: {0}")]
    DuplicateEntry(OutPoint),

    /// An import carried a layout this build does not understand.
    #[error("unsupported export version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Summing an account's outputs overflowed `u64`.
    #[error("balance overflow for {0}")]
    BalanceOverflow(Address),

    /// The configured backend is not compiled into this binary.
    #[error("backend `{0}` is not available in this build")]
    BackendUnavailable(&'static str),
}
