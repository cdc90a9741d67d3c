//! # Shared Types Crate
//!
//! Domain entities used by every ledger component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Transaction`, `Block` and the UTXO key
//!   (`OutPoint`) are defined once, here.
//! - **Canonical Hashing**: transaction ids and block hashes are computed from
//!   a fixed, length-prefixed field encoding so every node derives the same
//!   bytes regardless of serialization format.
//! - **Closed Kinds**: transaction kinds are a tagged enum, never free-form
//!   strings.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
