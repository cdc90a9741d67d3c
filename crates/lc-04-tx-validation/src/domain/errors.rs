//! # Rejection Reasons
//!
//! Every rejection names the pipeline stage that produced it and a stable
//! machine-readable code for callers to log or surface.

use shared_types::{Address, Amount, Hash, OutPoint, Timestamp};
use std::fmt;
use thiserror::Error;

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Structural,
    Format,
    Identity,
    Signature,
    Funding,
    Replay,
    Policy,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Structural => "structural",
            Stage::Format => "format",
            Stage::Identity => "identity",
            Stage::Signature => "signature",
            Stage::Funding => "funding",
            Stage::Replay => "replay",
            Stage::Policy => "policy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Signature verification failures, shared with block proposer checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("public key is not a valid SEC1 secp256k1 point")]
    InvalidPublicKey,

    #[error("signature is not a valid 64-byte (r, s) pair")]
    InvalidFormat,

    /// `s` in the upper half of the curve order.
    #[error("signature is malleable (high S)")]
    Malleable,

    #[error("signature does not verify")]
    Mismatch,

    #[error("secret key is not a valid secp256k1 scalar")]
    InvalidSecretKey,

    #[error("signing failed")]
    SigningFailed,
}

/// Why a transaction is not admissible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    // --- Structural ---
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("malformed field `{field}`: {detail}")]
    MalformedField { field: &'static str, detail: String },

    // --- Format ---
    #[error("`{0}` is the reserved zero address")]
    ReservedAddress(&'static str),

    #[error("amount must be positive")]
    ZeroAmount,

    #[error("timestamp {timestamp} is before the minimum {min}")]
    TimestampTooOld { timestamp: Timestamp, min: Timestamp },

    #[error("timestamp {timestamp} is beyond the allowed maximum {max}")]
    TimestampInFuture { timestamp: Timestamp, max: Timestamp },

    // --- Identity ---
    #[error("id {} does not match canonical hash {}", short(.claimed), short(.computed))]
    IdMismatch { claimed: Hash, computed: Hash },

    // --- Signature ---
    #[error(transparent)]
    BadSignature(#[from] SignatureError),

    #[error("public key belongs to {derived}, not sender {sender}")]
    SignerMismatch { sender: Address, derived: Address },

    // --- Funding ---
    #[error("transaction has no inputs")]
    NoInputs,

    #[error("input {0} is unknown or already spent")]
    UnknownInput(OutPoint),

    #[error("input {outpoint} is owned by {owner}")]
    ForeignInput { outpoint: OutPoint, owner: Address },

    #[error("input {0} appears more than once")]
    DuplicateInput(OutPoint),

    #[error("input {outpoint} is locked until {unlock_time}")]
    InputLocked {
        outpoint: OutPoint,
        unlock_time: Timestamp,
    },

    #[error("transaction has no outputs")]
    NoOutputs,

    #[error("output {index} is invalid: {detail}")]
    InvalidOutput { index: usize, detail: &'static str },

    #[error("insufficient funds: inputs {available}, outputs plus fee {required}")]
    InsufficientFunds { available: Amount, required: Amount },

    #[error("amount arithmetic overflowed")]
    AmountOverflow,

    /// The UTXO backend failed while answering a lookup.
    #[error("state unavailable: {0}")]
    StateUnavailable(String),

    // --- Replay ---
    #[error("invalid nonce: expected {expected}, got {actual}")]
    NonceMismatch { expected: u64, actual: u64 },

    #[error("nonce counter for {account} is exhausted")]
    NonceExhausted { account: Address },

    // --- Policy ---
    #[error("coinbase outputs sum to {outputs}, amount is {amount}")]
    CoinbaseValueMismatch { amount: Amount, outputs: Amount },

    #[error("locked transfer needs a non-empty lock_id")]
    MissingLockId,

    #[error("unlock time {unlock_time} is not after timestamp {timestamp}")]
    UnlockNotInFuture {
        unlock_time: Timestamp,
        timestamp: Timestamp,
    },

    #[error("governance vote needs a non-empty proposal_id")]
    MissingProposalId,

    #[error("unrecognized vote choice {0:?}")]
    UnknownVoteChoice(String),
}

impl RejectionReason {
    /// Stable reason code.
    pub fn code(&self) -> &'static str {
        use RejectionReason::*;
        match self {
            MissingField(_) | MalformedField { .. } => "bad_structure",
            ReservedAddress(_) | ZeroAmount | TimestampTooOld { .. } | TimestampInFuture { .. } => {
                "bad_format"
            }
            IdMismatch { .. } => "id_mismatch",
            BadSignature(_) => "bad_signature",
            SignerMismatch { .. } => "signer_mismatch",
            NoInputs => "missing_inputs",
            UnknownInput(_) => "unknown_input",
            ForeignInput { .. } => "foreign_input",
            DuplicateInput(_) => "duplicate_input",
            InputLocked { .. } => "locked_input",
            NoOutputs => "missing_outputs",
            InvalidOutput { .. } => "bad_output",
            InsufficientFunds { .. } => "insufficient_funds",
            AmountOverflow => "amount_overflow",
            StateUnavailable(_) => "state_unavailable",
            NonceMismatch { .. } => "nonce_mismatch",
            NonceExhausted { .. } => "nonce_exhausted",
            CoinbaseValueMismatch { .. }
            | MissingLockId
            | UnlockNotInFuture { .. }
            | MissingProposalId
            | UnknownVoteChoice(_) => "policy_violation",
        }
    }

    /// Stage that produced this rejection.
    pub fn stage(&self) -> Stage {
        use RejectionReason::*;
        match self {
            MissingField(_) | MalformedField { .. } => Stage::Structural,
            ReservedAddress(_) | ZeroAmount | TimestampTooOld { .. } | TimestampInFuture { .. } => {
                Stage::Format
            }
            IdMismatch { .. } => Stage::Identity,
            BadSignature(_) | SignerMismatch { .. } => Stage::Signature,
            NoInputs
            | UnknownInput(_)
            | ForeignInput { .. }
            | DuplicateInput(_)
            | InputLocked { .. }
            | NoOutputs
            | InvalidOutput { .. }
            | InsufficientFunds { .. }
            | AmountOverflow
            | StateUnavailable(_) => Stage::Funding,
            NonceMismatch { .. } | NonceExhausted { .. } => Stage::Replay,
            CoinbaseValueMismatch { .. }
            | MissingLockId
            | UnlockNotInFuture { .. }
            | MissingProposalId
            | UnknownVoteChoice(_) => Stage::Policy,
        }
    }
}

fn short(hash: &Hash) -> String {
    hex::encode(&hash[..4])
}
