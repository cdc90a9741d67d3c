//! # Core Domain Entities
//!
//! Defines the ledger entities handed to the commit pipeline by external
//! callers (wallets, block producers).
//!
//! ## Clusters
//!
//! - **Primitives**: `Hash`, `Address`, `Amount`, `Timestamp`
//! - **Value transfer**: `OutPoint`, `TxInput`, `TxOutput`, `Transaction`, `TxKind`
//! - **Chain**: `Block`, `ChainTip`

use crate::errors::{AddressParseError, VoteChoiceParseError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{hex::Hex, serde_as};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// PRIMITIVES
// =============================================================================

/// A 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Value in base units.
pub type Amount = u64;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The all-zero hash. Used as the parent of the genesis block.
pub const ZERO_HASH: Hash = [0u8; 32];

const TX_DOMAIN_TAG: &[u8] = b"ledger-core/tx/v1";
const BLOCK_DOMAIN_TAG: &[u8] = b"ledger-core/block/v1";

/// A 20-byte account address.
///
/// Derived from the owner's secp256k1 public key. Rendered as `0x`-prefixed
/// lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Reserved address. Never a valid sender, recipient or output owner.
    pub const ZERO: Address = Address([0u8; 20]);

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes =
            hex::decode(digits).map_err(|e| AddressParseError::InvalidHex(e.to_string()))?;
        let array: [u8; 20] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| AddressParseError::InvalidLength(bytes.len()))?;
        Ok(Address(array))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// VALUE TRANSFER
// =============================================================================

/// Key of an unspent output: the creating transaction and the output position.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OutPoint {
    #[serde_as(as = "Hex")]
    pub tx_id: Hash,
    pub index: u32,
}

impl OutPoint {
    pub fn new(tx_id: Hash, index: u32) -> Self {
        Self { tx_id, index }
    }

    /// Fixed-width big-endian key. Sorts the same way as `Ord`.
    pub fn to_key_bytes(&self) -> [u8; 36] {
        let mut key = [0u8; 36];
        key[..32].copy_from_slice(&self.tx_id);
        key[32..].copy_from_slice(&self.index.to_be_bytes());
        key
    }
}

impl fmt::Debug for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", hex::encode(&self.tx_id[..4]), self.index)
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Reference to a previously created output being consumed.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxInput {
    #[serde_as(as = "Hex")]
    pub source_tx_id: Hash,
    pub output_index: u32,
}

impl TxInput {
    pub fn new(source_tx_id: Hash, output_index: u32) -> Self {
        Self {
            source_tx_id,
            output_index,
        }
    }

    pub fn outpoint(&self) -> OutPoint {
        OutPoint::new(self.source_tx_id, self.output_index)
    }
}

/// A new output created by a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub account: Address,
    pub amount: Amount,
}

impl TxOutput {
    pub fn new(account: Address, amount: Amount) -> Self {
        Self { account, amount }
    }
}

/// Governance vote values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    Yes,
    No,
    Abstain,
}

impl FromStr for VoteChoice {
    type Err = VoteChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yes" => Ok(VoteChoice::Yes),
            "no" => Ok(VoteChoice::No),
            "abstain" => Ok(VoteChoice::Abstain),
            other => Err(VoteChoiceParseError(other.to_string())),
        }
    }
}

/// Transaction kind with its kind-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// Plain value transfer funded by inputs.
    #[default]
    Ordinary,
    /// Newly minted value. No inputs.
    Coinbase,
    /// Transfer whose outputs to others cannot be spent before `unlock_time`.
    LockedTransfer { lock_id: String, unlock_time: Timestamp },
    /// A vote on a governance proposal. `choice` is parsed during validation.
    GovernanceVote { proposal_id: String, choice: String },
}

impl TxKind {
    pub fn is_coinbase(&self) -> bool {
        matches!(self, TxKind::Coinbase)
    }

    pub fn label(&self) -> &'static str {
        match self {
            TxKind::Ordinary => "ordinary",
            TxKind::Coinbase => "coinbase",
            TxKind::LockedTransfer { .. } => "locked_transfer",
            TxKind::GovernanceVote { .. } => "governance_vote",
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        match self {
            TxKind::Ordinary => hasher.update([0u8]),
            TxKind::Coinbase => hasher.update([1u8]),
            TxKind::LockedTransfer {
                lock_id,
                unlock_time,
            } => {
                hasher.update([2u8]);
                put_bytes(hasher, lock_id.as_bytes());
                hasher.update(unlock_time.to_le_bytes());
            }
            TxKind::GovernanceVote {
                proposal_id,
                choice,
            } => {
                hasher.update([3u8]);
                put_bytes(hasher, proposal_id.as_bytes());
                put_bytes(hasher, choice.as_bytes());
            }
        }
    }
}

/// A signed transaction as handed over by a wallet.
///
/// `id` is the canonical hash of every other field except `signature`, and
/// `signature` is an ECDSA signature over `id`. Both are optional on input in
/// the sense that an unsigned draft carries empty bytes / `None`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: Address,
    /// `None` for burns.
    pub recipient: Option<Address>,
    pub amount: Amount,
    pub fee: Amount,
    pub timestamp: Timestamp,
    pub nonce: u64,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
    /// SEC1-encoded secp256k1 public key (compressed or uncompressed).
    #[serde_as(as = "Hex")]
    pub public_key: Vec<u8>,
    #[serde_as(as = "Option<Hex>")]
    pub id: Option<Hash>,
    pub kind: TxKind,
    pub metadata: BTreeMap<String, String>,
}

impl Transaction {
    /// Unsigned ordinary draft with no inputs or outputs.
    pub fn draft(
        sender: Address,
        amount: Amount,
        fee: Amount,
        nonce: u64,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            sender,
            recipient: None,
            amount,
            fee,
            timestamp,
            nonce,
            inputs: Vec::new(),
            outputs: Vec::new(),
            signature: Vec::new(),
            public_key: Vec::new(),
            id: None,
            kind: TxKind::Ordinary,
            metadata: BTreeMap::new(),
        }
    }

    /// Compute the canonical transaction hash.
    ///
    /// Covers every field except `id` and `signature`, length-prefixed and in
    /// declaration order.
    pub fn compute_id(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(TX_DOMAIN_TAG);
        hasher.update(self.sender.0);
        match &self.recipient {
            Some(recipient) => {
                hasher.update([1u8]);
                hasher.update(recipient.0);
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.fee.to_le_bytes());
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());

        hasher.update((self.inputs.len() as u64).to_le_bytes());
        for input in &self.inputs {
            hasher.update(input.source_tx_id);
            hasher.update(input.output_index.to_le_bytes());
        }

        hasher.update((self.outputs.len() as u64).to_le_bytes());
        for output in &self.outputs {
            hasher.update(output.account.0);
            hasher.update(output.amount.to_le_bytes());
        }

        put_bytes(&mut hasher, &self.public_key);
        self.kind.hash_into(&mut hasher);

        hasher.update((self.metadata.len() as u64).to_le_bytes());
        for (key, value) in &self.metadata {
            put_bytes(&mut hasher, key.as_bytes());
            put_bytes(&mut hasher, value.as_bytes());
        }

        hasher.finalize().into()
    }

    /// The stored id, or the canonical hash when none is set.
    pub fn id_or_compute(&self) -> Hash {
        self.id.unwrap_or_else(|| self.compute_id())
    }

    /// Fill in `id` if missing and return it.
    pub fn ensure_id(&mut self) -> Hash {
        if let Some(id) = self.id {
            return id;
        }
        let id = self.compute_id();
        self.id = Some(id);
        id
    }

    /// Outpoints consumed by this transaction, in input order.
    pub fn outpoints(&self) -> impl Iterator<Item = OutPoint> + '_ {
        self.inputs.iter().map(TxInput::outpoint)
    }

    /// Sum of output amounts, `None` on overflow.
    pub fn output_total(&self) -> Option<Amount> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.amount))
    }
}

// =============================================================================
// CHAIN
// =============================================================================

/// A candidate or committed block.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    #[serde_as(as = "Hex")]
    pub previous_hash: Hash,
    #[serde_as(as = "Hex")]
    pub merkle_root: Hash,
    pub timestamp: Timestamp,
    pub difficulty: u32,
    pub nonce: u64,
    #[serde_as(as = "Hex")]
    pub proposer_key: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub signature: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub hash: Hash,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Compute the header hash. Excludes `hash`, `signature` and the
    /// transaction bodies (committed to through `merkle_root`).
    pub fn compute_hash(&self) -> Hash {
        let mut hasher = Sha256::new();
        hasher.update(BLOCK_DOMAIN_TAG);
        hasher.update(self.height.to_le_bytes());
        hasher.update(self.previous_hash);
        hasher.update(self.merkle_root);
        hasher.update(self.timestamp.to_le_bytes());
        hasher.update(self.difficulty.to_le_bytes());
        hasher.update(self.nonce.to_le_bytes());
        put_bytes(&mut hasher, &self.proposer_key);
        hasher.finalize().into()
    }

    pub fn tip(&self) -> ChainTip {
        ChainTip {
            height: self.height,
            hash: self.hash,
        }
    }
}

/// Height and hash of the last committed block.
#[serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    pub height: u64,
    #[serde_as(as = "Hex")]
    pub hash: Hash,
}

fn put_bytes(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}
