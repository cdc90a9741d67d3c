//! # Outbound Ports
//!
//! Seams for the pieces of persistence that tests want to control.

/// Content checksum over serialized state.
pub trait ChecksumProvider: Send + Sync {
    /// Lowercase hex digest of `data`.
    fn checksum(&self, data: &[u8]) -> String;

    fn verify(&self, data: &[u8], expected: &str) -> bool {
        self.checksum(data).eq_ignore_ascii_case(expected)
    }
}

/// Wall clock in Unix seconds.
pub trait TimeSource: Send + Sync {
    fn now(&self) -> u64;
}
