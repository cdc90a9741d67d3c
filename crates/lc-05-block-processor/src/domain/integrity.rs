//! Self-consistency of a block: the header hash, the merkle commitment and
//! the proposer's signature over the hash.

use super::errors::IntegrityError;
use super::merkle::merkle_root;
use lc_04_tx_validation::verify_prehash;
use shared_types::Block;

pub fn verify_header_hash(block: &Block) -> Result<(), IntegrityError> {
    let computed = block.compute_hash();
    if computed != block.hash {
        return Err(IntegrityError::HashMismatch {
            recorded: block.hash,
            computed,
        });
    }
    Ok(())
}

pub fn verify_integrity(block: &Block) -> Result<(), IntegrityError> {
    verify_header_hash(block)?;

    let computed = merkle_root(&block.transactions);
    if computed != block.merkle_root {
        return Err(IntegrityError::MerkleMismatch {
            recorded: block.merkle_root,
            computed,
        });
    }

    verify_prehash(&block.hash, &block.signature, &block.proposer_key)
        .map_err(IntegrityError::ProposerSignature)?;
    Ok(())
}
