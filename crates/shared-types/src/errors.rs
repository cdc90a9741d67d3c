//! # Error Types
//!
//! Parse errors for the shared primitives.

use thiserror::Error;

/// Errors produced when parsing an [`Address`](crate::Address) from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressParseError {
    /// Input was not valid hexadecimal.
    #[error("address is not valid hex: {0}")]
    InvalidHex(String),

    /// Decoded input had the wrong length.
    #[error("address must be 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// Errors produced when parsing a governance vote choice.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized vote choice: {0:?}")]
pub struct VoteChoiceParseError(pub String);
