use shared_types::Address;
use thiserror::Error;

/// Errors raised by the nonce tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NonceError {
    /// Attempt to move a counter below its current value.
    #[error("nonce regression for {account}: current {current}, requested {requested}")]
    Regression {
        account: Address,
        current: u64,
        requested: u64,
    },
}
