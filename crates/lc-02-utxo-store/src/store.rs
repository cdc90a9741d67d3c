//! # UTXO Store Facade
//!
//! All reads and writes go through one mutex, so a caller never observes a
//! half-applied `mark_spent` or `import`. Unspent count and value are kept as
//! running counters and recomputed from scratch whenever the backend is
//! swapped or reloaded.

use crate::adapters::DynBackend;
use crate::domain::entities::{SpendCondition, Utxo, UtxoExport, EXPORT_VERSION};
use crate::domain::errors::UtxoError;
use crate::ports::backend::UtxoBackend;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use shared_types::{Address, Amount, Hash, OutPoint};

const DIGEST_DOMAIN_TAG: &[u8] = b"ledger-core/utxo-set/v1";

struct StoreInner<B> {
    backend: B,
    unspent_count: u64,
    unspent_total: u128,
}

impl<B: UtxoBackend> StoreInner<B> {
    fn recount(&mut self) -> Result<(), UtxoError> {
        let (count, total) = tally(&self.backend.all()?);
        self.unspent_count = count;
        self.unspent_total = total;
        Ok(())
    }
}

fn tally(entries: &[Utxo]) -> (u64, u128) {
    entries
        .iter()
        .filter(|u| u.is_unspent())
        .fold((0u64, 0u128), |(count, total), u| {
            (count + 1, total + u128::from(u.amount))
        })
}

/// Thread-safe unspent-output set over a pluggable backend.
pub struct UtxoStore<B: UtxoBackend = DynBackend> {
    inner: Mutex<StoreInner<B>>,
}

impl<B: UtxoBackend> UtxoStore<B> {
    /// Wrap `backend`, counting whatever it already holds.
    pub fn new(backend: B) -> Result<Self, UtxoError> {
        let mut inner = StoreInner {
            backend,
            unspent_count: 0,
            unspent_total: 0,
        };
        inner.recount()?;
        tracing::debug!(
            backend = inner.backend.name(),
            unspent = inner.unspent_count,
            "UTXO store opened"
        );
        Ok(Self {
            inner: Mutex::new(inner),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        self.inner.lock().backend.name()
    }

    /// Record a new unspent output.
    ///
    /// Returns `Ok(false)` and leaves the store untouched when the key
    /// already exists, spent or not.
    pub fn add(
        &self,
        owner: Address,
        tx_id: Hash,
        index: u32,
        amount: Amount,
        spend_condition: SpendCondition,
    ) -> Result<bool, UtxoError> {
        let mut inner = self.inner.lock();
        let outpoint = OutPoint::new(tx_id, index);
        if inner.backend.get(&outpoint)?.is_some() {
            tracing::debug!(%outpoint, "duplicate UTXO add ignored");
            return Ok(false);
        }

        let utxo = Utxo::new(owner, tx_id, index, amount, spend_condition);
        inner.backend.put(&utxo)?;
        inner.unspent_count += 1;
        inner.unspent_total += u128::from(amount);
        tracing::trace!(%outpoint, %owner, amount, "UTXO added");
        Ok(true)
    }

    /// Flip an unspent output to spent.
    ///
    /// Returns `Ok(false)` when the key is unknown or already spent.
    pub fn mark_spent(&self, tx_id: &Hash, index: u32) -> Result<bool, UtxoError> {
        let mut inner = self.inner.lock();
        let outpoint = OutPoint::new(*tx_id, index);
        let Some(mut utxo) = inner.backend.get(&outpoint)? else {
            return Ok(false);
        };
        if utxo.spent {
            return Ok(false);
        }

        utxo.spent = true;
        inner.backend.put(&utxo)?;
        inner.unspent_count -= 1;
        inner.unspent_total -= u128::from(utxo.amount);
        tracing::trace!(%outpoint, "UTXO spent");
        Ok(true)
    }

    /// The output at `(tx_id, index)` if it exists and is unspent.
    pub fn get(&self, tx_id: &Hash, index: u32) -> Result<Option<Utxo>, UtxoError> {
        Ok(self
            .entry(&OutPoint::new(*tx_id, index))?
            .filter(Utxo::is_unspent))
    }

    /// The output at `outpoint` whether spent or not.
    pub fn entry(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        self.inner.lock().backend.get(outpoint)
    }

    /// Unspent outputs owned by `owner`, sorted by outpoint.
    pub fn list_for(&self, owner: &Address) -> Result<Vec<Utxo>, UtxoError> {
        let mut owned = self.inner.lock().backend.owned_by(owner)?;
        owned.retain(Utxo::is_unspent);
        Ok(owned)
    }

    /// Sum of unspent amounts owned by `owner`.
    pub fn balance(&self, owner: &Address) -> Result<Amount, UtxoError> {
        self.list_for(owner)?
            .iter()
            .try_fold(0u64, |acc, u| acc.checked_add(u.amount))
            .ok_or(UtxoError::BalanceOverflow(*owner))
    }

    pub fn unspent_count(&self) -> u64 {
        self.inner.lock().unspent_count
    }

    pub fn unspent_total(&self) -> u128 {
        self.inner.lock().unspent_total
    }

    /// SHA-256 over every entry (spent included) in outpoint order.
    ///
    /// Equal contents give equal digests no matter the insertion order.
    pub fn digest(&self) -> Result<Hash, UtxoError> {
        let mut entries = self.inner.lock().backend.all()?;
        entries.sort_by_key(|u| u.outpoint);

        let mut hasher = Sha256::new();
        hasher.update(DIGEST_DOMAIN_TAG);
        hasher.update((entries.len() as u64).to_le_bytes());
        for utxo in &entries {
            utxo.hash_into(&mut hasher);
        }
        Ok(hasher.finalize().into())
    }

    /// Dump every entry, spent included.
    pub fn export(&self) -> Result<UtxoExport, UtxoError> {
        let inner = self.inner.lock();
        let mut entries = inner.backend.all()?;
        entries.sort_by_key(|u| u.outpoint);
        Ok(UtxoExport {
            version: EXPORT_VERSION,
            unspent_count: inner.unspent_count,
            entries,
        })
    }

    /// Replace the entire contents with `export`.
    ///
    /// Counters are rebuilt from the entries. On error the store is left as it
    /// was.
    pub fn import(&self, export: UtxoExport) -> Result<(), UtxoError> {
        if export.version != EXPORT_VERSION {
            return Err(UtxoError::UnsupportedVersion {
                found: export.version,
                expected: EXPORT_VERSION,
            });
        }

        let mut entries = export.entries;
        entries.sort_by_key(|u| u.outpoint);
        if let Some(pair) = entries
            .windows(2)
            .find(|pair| pair[0].outpoint == pair[1].outpoint)
        {
            return Err(UtxoError::DuplicateEntry(pair[0].outpoint));
        }

        let (count, total) = tally(&entries);
        if count != export.unspent_count {
            tracing::warn!(
                stored_count = export.unspent_count,
                actual_count = count,
                "UTXO export counters disagree with entries, using recomputed values"
            );
        }

        let mut inner = self.inner.lock();
        inner.backend.replace_all(&entries)?;
        inner.unspent_count = count;
        inner.unspent_total = total;
        tracing::debug!(entries = entries.len(), unspent = count, "UTXO set imported");
        Ok(())
    }
}
