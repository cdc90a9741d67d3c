//! # In-Memory Backend

use crate::domain::entities::Utxo;
use crate::domain::errors::UtxoError;
use crate::ports::backend::UtxoBackend;
use shared_types::{Address, OutPoint};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Ordered map keyed by outpoint with a secondary owner index.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<OutPoint, Utxo>,
    by_owner: HashMap<Address, BTreeSet<OutPoint>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn unindex(&mut self, owner: &Address, outpoint: &OutPoint) {
        if let Some(set) = self.by_owner.get_mut(owner) {
            set.remove(outpoint);
            if set.is_empty() {
                self.by_owner.remove(owner);
            }
        }
    }
}

impl UtxoBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        Ok(self.entries.get(outpoint).cloned())
    }

    fn put(&mut self, utxo: &Utxo) -> Result<(), UtxoError> {
        if let Some(previous) = self.entries.insert(utxo.outpoint, utxo.clone()) {
            if previous.owner != utxo.owner {
                self.unindex(&previous.owner, &previous.outpoint);
            }
        }
        self.by_owner
            .entry(utxo.owner)
            .or_default()
            .insert(utxo.outpoint);
        Ok(())
    }

    fn owned_by(&self, owner: &Address) -> Result<Vec<Utxo>, UtxoError> {
        let Some(outpoints) = self.by_owner.get(owner) else {
            return Ok(Vec::new());
        };
        Ok(outpoints
            .iter()
            .filter_map(|outpoint| self.entries.get(outpoint).cloned())
            .collect())
    }

    fn all(&self) -> Result<Vec<Utxo>, UtxoError> {
        Ok(self.entries.values().cloned().collect())
    }

    fn replace_all(&mut self, entries: &[Utxo]) -> Result<(), UtxoError> {
        self.entries.clear();
        self.by_owner.clear();
        for utxo in entries {
            self.put(utxo)?;
        }
        Ok(())
    }
}
