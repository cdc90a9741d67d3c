//! Proposer-side helpers: lay out a candidate block on top of a tip and seal
//! it with a merkle root, header hash and signature.
//!
//! The mining search itself lives outside this crate; these helpers produce
//! exactly what `commit` checks.

use super::linkage::expected_successor;
use super::merkle::merkle_root;
use lc_04_tx_validation::{SignatureError, TransactionSigner};
use shared_types::{Block, ChainTip, Hash, Timestamp, Transaction, ZERO_HASH};

/// Unsealed block extending `parent` (or genesis when `None`).
pub fn candidate_block(
    parent: Option<ChainTip>,
    timestamp: Timestamp,
    transactions: Vec<Transaction>,
) -> Block {
    let (height, previous_hash) = expected_successor(parent);
    Block {
        height,
        previous_hash,
        merkle_root: merkle_root(&transactions),
        timestamp,
        difficulty: 0,
        nonce: 0,
        proposer_key: Vec::new(),
        signature: Vec::new(),
        hash: ZERO_HASH,
        transactions,
    }
}

/// Recompute the merkle root, then set the proposer key, header hash and
/// signature. Returns the block hash.
pub fn seal_block(block: &mut Block, proposer: &TransactionSigner) -> Result<Hash, SignatureError> {
    block.merkle_root = merkle_root(&block.transactions);
    block.proposer_key = proposer.public_key().to_vec();
    block.hash = block.compute_hash();
    block.signature = proposer.sign_hash(&block.hash)?;
    Ok(block.hash)
}
