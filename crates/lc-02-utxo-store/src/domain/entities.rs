//! # UTXO Entities

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shared_types::{Address, Amount, Hash, OutPoint, Timestamp};

/// Current layout of [`UtxoExport`].
pub const EXPORT_VERSION: u32 = 1;

/// Who may spend an output, and when.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendCondition {
    /// The owner may spend at any time.
    #[default]
    Owner,
    /// The owner may spend once the spending transaction's timestamp reaches
    /// `unlock_time`.
    LockedUntil {
        lock_id: String,
        unlock_time: Timestamp,
    },
}

impl SpendCondition {
    /// Whether a transaction stamped `at` may consume an output under this
    /// condition.
    pub fn is_unlocked_at(&self, at: Timestamp) -> bool {
        match self {
            SpendCondition::Owner => true,
            SpendCondition::LockedUntil { unlock_time, .. } => at >= *unlock_time,
        }
    }

    /// The lock's release time, if any.
    pub fn unlock_time(&self) -> Option<Timestamp> {
        match self {
            SpendCondition::Owner => None,
            SpendCondition::LockedUntil { unlock_time, .. } => Some(*unlock_time),
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            SpendCondition::Owner => hasher.update([0u8]),
            SpendCondition::LockedUntil {
                lock_id,
                unlock_time,
            } => {
                hasher.update([1u8]);
                hasher.update((lock_id.len() as u64).to_le_bytes());
                hasher.update(lock_id.as_bytes());
                hasher.update(unlock_time.to_le_bytes());
            }
        }
    }
}

/// A single transaction output.
///
/// Entries are never deleted: spending flips `spent` and the record stays for
/// audit and export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub outpoint: OutPoint,
    pub owner: Address,
    pub amount: Amount,
    pub spend_condition: SpendCondition,
    pub spent: bool,
}

impl Utxo {
    pub fn new(
        owner: Address,
        tx_id: Hash,
        index: u32,
        amount: Amount,
        spend_condition: SpendCondition,
    ) -> Self {
        Self {
            outpoint: OutPoint::new(tx_id, index),
            owner,
            amount,
            spend_condition,
            spent: false,
        }
    }

    pub fn source_tx_id(&self) -> Hash {
        self.outpoint.tx_id
    }

    pub fn output_index(&self) -> u32 {
        self.outpoint.index
    }

    pub fn is_unspent(&self) -> bool {
        !self.spent
    }

    /// Feed the canonical bytes of this entry into a digest.
    ///
    /// Covers every field, including the spent flag, so a digest changes when
    /// anything about an entry changes.
    pub(crate) fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.outpoint.to_key_bytes());
        hasher.update(self.owner.0);
        hasher.update(self.amount.to_le_bytes());
        self.spend_condition.hash_into(hasher);
        hasher.update([u8::from(self.spent)]);
    }
}

/// Serializable dump of a whole store.
///
/// `unspent_count` is informational. `import` recomputes it from `entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoExport {
    pub version: u32,
    pub unspent_count: u64,
    /// Sorted by outpoint.
    pub entries: Vec<Utxo>,
}

impl UtxoExport {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
