//! # Storage Backend Port
//!
//! The store owns all invariants (uniqueness, spend-once, counters). A backend
//! is plain keyed storage with an owner index, so memory and on-disk engines
//! are interchangeable behind the same contract tests.

use crate::domain::entities::Utxo;
use crate::domain::errors::UtxoError;
use shared_types::{Address, OutPoint};

/// Keyed storage for UTXO records.
pub trait UtxoBackend: Send {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Fetch an entry whether spent or not.
    fn get(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError>;

    /// Insert or overwrite the entry keyed by `utxo.outpoint`.
    fn put(&mut self, utxo: &Utxo) -> Result<(), UtxoError>;

    /// Every entry (spent or not) owned by `owner`, sorted by outpoint.
    fn owned_by(&self, owner: &Address) -> Result<Vec<Utxo>, UtxoError>;

    /// Every entry, sorted by outpoint.
    fn all(&self) -> Result<Vec<Utxo>, UtxoError>;

    /// Drop everything and load `entries` in one step.
    fn replace_all(&mut self, entries: &[Utxo]) -> Result<(), UtxoError>;
}

impl<B: UtxoBackend + ?Sized> UtxoBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        (**self).get(outpoint)
    }

    fn put(&mut self, utxo: &Utxo) -> Result<(), UtxoError> {
        (**self).put(utxo)
    }

    fn owned_by(&self, owner: &Address) -> Result<Vec<Utxo>, UtxoError> {
        (**self).owned_by(owner)
    }

    fn all(&self) -> Result<Vec<Utxo>, UtxoError> {
        (**self).all()
    }

    fn replace_all(&mut self, entries: &[Utxo]) -> Result<(), UtxoError> {
        (**self).replace_all(entries)
    }
}
