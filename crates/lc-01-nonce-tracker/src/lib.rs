//! # Nonce Tracker (lc-01)
//!
//! Per-account monotonic counters that stop a signed transaction from being
//! applied twice.
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement |
//! |----|-----------|-------------|
//! | 1 | Exact successor | `validate(a, n)` holds iff `n == current(a) + 1` |
//! | 2 | Monotonicity | `advance` refuses to move a counter backwards |
//! | 3 | Restorable | `snapshot()`/`restore()` round-trip the whole map |
//!
//! Counters are persisted as part of the chain state snapshot; on load the
//! persisted values are trusted as-is.

pub mod errors;
pub mod tracker;

pub use errors::NonceError;
pub use tracker::{NonceSnapshot, NonceTracker};
