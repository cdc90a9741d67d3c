//! # Block Processor Errors
//!
//! | Error | Raised by | State afterwards |
//! |-------|-----------|------------------|
//! | `AdmissionError` | `submit_transaction` | untouched |
//! | `LinkageError` | `commit`, `submit_block` | untouched |
//! | `IntegrityError` | `commit`, `submit_block` | untouched |
//! | `CommitError::TransactionRejected` | `commit` | rolled back |
//! | `CommitError::Persistence` | `commit` | rolled back |
//! | `CommitError::RollbackFailed` | `commit` | **inconsistent**, restart required |

use lc_01_nonce_tracker::NonceError;
use lc_02_utxo_store::UtxoError;
use lc_03_state_store::PersistenceError;
use lc_04_tx_validation::{RejectionReason, SignatureError};
use shared_types::{Address, Hash, OutPoint};
use thiserror::Error;

/// The block does not extend the current tip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkageError {
    #[error("expected block at height {expected}, got {found}")]
    UnexpectedHeight { expected: u64, found: u64 },

    #[error(
        "block {height} does not build on the tip: parent {}, tip {}",
        hex::encode(.found),
        hex::encode(.expected)
    )]
    ParentMismatch {
        height: u64,
        expected: Hash,
        found: Hash,
    },
}

/// The block is internally inconsistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error(
        "block hash mismatch: recorded {}, computed {}",
        hex::encode(.recorded),
        hex::encode(.computed)
    )]
    HashMismatch { recorded: Hash, computed: Hash },

    #[error(
        "merkle root mismatch: recorded {}, computed {}",
        hex::encode(.recorded),
        hex::encode(.computed)
    )]
    MerkleMismatch { recorded: Hash, computed: Hash },

    #[error("proposer signature invalid: {0}")]
    ProposerSignature(#[source] SignatureError),
}

/// A commit did not happen.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error(transparent)]
    Linkage(#[from] LinkageError),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("transaction {index} ({tx_id}) rejected: {reason}")]
    TransactionRejected {
        index: usize,
        tx_id: String,
        reason: RejectionReason,
    },

    /// An input or output key collided while applying a transaction that had
    /// passed validation.
    #[error("transaction {index} conflicts with existing entry {outpoint}")]
    Conflict { index: usize, outpoint: OutPoint },

    #[error("UTXO store error: {0}")]
    Store(#[from] UtxoError),

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("failed to persist state: {0}")]
    Persistence(#[from] PersistenceError),

    /// Restoring the pre-commit state failed. In-memory state no longer
    /// matches anything on disk.
    #[error("rollback failed ({restore}) after commit error: {cause}")]
    RollbackFailed {
        cause: Box<CommitError>,
        restore: UtxoError,
    },
}

impl CommitError {
    pub(crate) fn rejected(index: usize, tx_id: &Hash, reason: RejectionReason) -> Self {
        CommitError::TransactionRejected {
            index,
            tx_id: hex::encode(&tx_id[..8]),
            reason,
        }
    }

    /// True when in-memory state was left untouched or fully restored.
    pub fn is_clean(&self) -> bool {
        !matches!(self, CommitError::RollbackFailed { .. })
    }
}

/// A transaction was refused entry to the mempool.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdmissionError {
    #[error("rejected: {0}")]
    Rejected(#[from] RejectionReason),

    #[error("transaction {} is already pending", hex::encode(.0))]
    Duplicate(Hash),

    #[error("mempool full at {capacity} transactions")]
    PoolFull { capacity: usize },

    #[error("{sender} already has a pending transaction with nonce {nonce}")]
    NonceTaken { sender: Address, nonce: u64 },

    #[error("output {outpoint} is already claimed by pending transaction {}", hex::encode(.claimed_by))]
    OutpointClaimed { outpoint: OutPoint, claimed_by: Hash },

    #[error("state error: {0}")]
    StateError(String),
}

impl AdmissionError {
    /// Stable code for callers that surface the reason.
    pub fn code(&self) -> &'static str {
        match self {
            AdmissionError::Rejected(reason) => reason.code(),
            AdmissionError::Duplicate(_) => "duplicate",
            AdmissionError::PoolFull { .. } => "pool_full",
            AdmissionError::NonceTaken { .. } => "nonce_taken",
            AdmissionError::OutpointClaimed { .. } => "double_spend",
            AdmissionError::StateError(_) => "state_error",
        }
    }
}

/// A post-commit hook failed. Logged only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct HookError(pub String);
