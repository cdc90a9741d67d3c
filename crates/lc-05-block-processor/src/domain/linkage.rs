//! Chain extension rule: a block must sit exactly one above the tip and name
//! the tip's hash as its parent. The first block is height 0 with parent
//! `ZERO_HASH`.

use super::errors::LinkageError;
use shared_types::{Block, ChainTip, Hash, ZERO_HASH};

/// Height and parent hash the next block must carry.
pub fn expected_successor(tip: Option<ChainTip>) -> (u64, Hash) {
    match tip {
        Some(tip) => (tip.height.saturating_add(1), tip.hash),
        None => (0, ZERO_HASH),
    }
}

pub fn check_linkage(tip: Option<ChainTip>, block: &Block) -> Result<(), LinkageError> {
    let (height, parent) = expected_successor(tip);
    if block.height != height {
        return Err(LinkageError::UnexpectedHeight {
            expected: height,
            found: block.height,
        });
    }
    if block.previous_hash != parent {
        return Err(LinkageError::ParentMismatch {
            height: block.height,
            expected: parent,
            found: block.previous_hash,
        });
    }
    Ok(())
}
