//! # Domain Layer
//!
//! Pure UTXO entities and errors.

pub mod entities;
pub mod errors;
