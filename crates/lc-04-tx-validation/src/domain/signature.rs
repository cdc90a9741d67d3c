//! # ECDSA (secp256k1)
//!
//! Signatures are 64-byte `r || s` over a 32-byte prehash (the transaction id
//! or block hash). Public keys are SEC1, compressed or uncompressed.
//!
//! ## Security Notes
//!
//! - **Malleability**: `s` must be in the lower half of the curve order.
//! - **Scalar range**: `k256` rejects zero or out-of-range `r`/`s` on parse.
//! - **Address binding**: an address is the last 20 bytes of
//!   `keccak256(uncompressed_pubkey[1..])`.

use crate::domain::errors::SignatureError;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use sha3::{Digest, Keccak256};
use shared_types::{Address, Hash};

/// Length of an `r || s` signature.
pub const SIGNATURE_LEN: usize = 64;

/// Verify `signature` over `prehash` and return the parsed key.
pub fn verify_prehash(
    prehash: &Hash,
    signature: &[u8],
    public_key: &[u8],
) -> Result<VerifyingKey, SignatureError> {
    let key =
        VerifyingKey::from_sec1_bytes(public_key).map_err(|_| SignatureError::InvalidPublicKey)?;
    let sig = Signature::from_slice(signature).map_err(|_| SignatureError::InvalidFormat)?;

    // `normalize_s` returns a value only when `s` was high.
    if sig.normalize_s().is_some() {
        return Err(SignatureError::Malleable);
    }

    key.verify_prehash(prehash, &sig)
        .map_err(|_| SignatureError::Mismatch)?;
    Ok(key)
}

/// Keccak256 hash function.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Derive the account address of a public key.
pub fn address_from_public_key(public_key: &VerifyingKey) -> Address {
    let encoded = public_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed prefix.
    let hash = keccak256(&encoded.as_bytes()[1..]);

    let mut address = [0u8; 20];
    address.copy_from_slice(&hash[12..]);
    Address(address)
}
