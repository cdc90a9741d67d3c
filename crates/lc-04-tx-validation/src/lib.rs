//! # Transaction Validation (lc-04)
//!
//! Decides whether a transaction may enter the mempool or a block. Validation
//! never mutates the UTXO set or the nonce counters.
//!
//! ## Pipeline
//!
//! | # | Stage | Needs state | Rejects |
//! |---|-------|-------------|---------|
//! | 1 | Structural | no | missing id, signature or key; wrong byte lengths |
//! | 2 | Format | no | reserved addresses, zero amount, timestamp window |
//! | 3 | Identity | no | `id` ≠ canonical hash |
//! | 4 | Signature | no | bad/high-S signature, key not bound to `sender` |
//! | 5 | Funding | UTXO set | unknown/foreign/locked/duplicate inputs, overspend |
//! | 6 | Replay | nonces | anything but the exact next nonce |
//! | 7 | Policy | no | kind-specific rules |
//!
//! Stages 1-4 are pure and run in parallel across a batch with `rayon`.
//! Stages 5-7 run sequentially against one view of live state. The first
//! failing stage wins.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - rejection reasons, ECDSA helpers, config, kind policy
//! - `ports/` - read-only `UtxoView`, `NonceView`, `TimeSource`
//! - `adapters/` - views over `UtxoStore` / `NonceTracker`, system clock
//! - `validator.rs` - `TransactionValidator`
//! - `signer.rs` - `TransactionSigner`, the wallet-side counterpart

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod signer;
pub mod validator;

pub use adapters::time::SystemTimeSource;
pub use domain::config::ValidationConfig;
pub use domain::errors::{RejectionReason, SignatureError, Stage};
pub use domain::signature::{address_from_public_key, keccak256, verify_prehash};
pub use ports::outbound::{NonceView, TimeSource, UtxoView};
pub use signer::TransactionSigner;
pub use validator::TransactionValidator;
