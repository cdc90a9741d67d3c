//! # Merkle Root
//!
//! Binary SHA-256 tree over transaction ids.
//!
//! - No transactions: `SHA-256("")`
//! - One transaction: its id
//! - Otherwise: hash adjacent pairs left to right, duplicating the last hash
//!   of any level with an odd count, until one hash remains.
//!
//! The root is order-sensitive.

use sha2::{Digest, Sha256};
use shared_types::{Hash, Transaction};

/// Root of an empty transaction list.
pub fn empty_root() -> Hash {
    Sha256::digest(b"").into()
}

/// Root over `transactions`. Missing ids are computed on the fly.
pub fn merkle_root(transactions: &[Transaction]) -> Hash {
    merkle_root_of_ids(
        transactions
            .iter()
            .map(Transaction::id_or_compute)
            .collect(),
    )
}

/// Root over already-known leaf hashes.
pub fn merkle_root_of_ids(mut level: Vec<Hash>) -> Hash {
    if level.is_empty() {
        return empty_root();
    }

    while level.len() > 1 {
        if level.len() % 2 == 1 {
            if let Some(&last) = level.last() {
                level.push(last);
            }
        }
        level = level
            .chunks_exact(2)
            .map(|pair| hash_pair(&pair[0], &pair[1]))
            .collect();
    }

    level.pop().unwrap_or_else(empty_root)
}

/// parent = H(left || right)
fn hash_pair(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}
