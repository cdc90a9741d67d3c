//! # Adapters
//!
//! - `state` - read-only views over the live UTXO store and nonce tracker
//! - `time` - wall clock

pub mod state;
pub mod time;
