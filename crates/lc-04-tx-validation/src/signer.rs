//! # Transaction Signer
//!
//! Wallet-side counterpart of the signature stage. The validator never uses
//! it; callers and tests do.

use crate::domain::errors::SignatureError;
use crate::domain::signature::address_from_public_key;
use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use shared_types::{Address, Hash, Transaction};

/// A secp256k1 key able to sign transactions and block hashes.
#[derive(Clone)]
pub struct TransactionSigner {
    key: SigningKey,
    address: Address,
    public_key: Vec<u8>,
}

impl std::fmt::Debug for TransactionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSigner")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl TransactionSigner {
    /// Load a 32-byte secret scalar.
    pub fn from_secret_bytes(secret: &[u8]) -> Result<Self, SignatureError> {
        let key = SigningKey::from_slice(secret).map_err(|_| SignatureError::InvalidSecretKey)?;
        Ok(Self::from_key(key))
    }

    /// Fresh key from the OS random source.
    pub fn random() -> Self {
        Self::from_key(SigningKey::random(&mut rand::rngs::OsRng))
    }

    fn from_key(key: SigningKey) -> Self {
        let verifying = VerifyingKey::from(&key);
        let address = address_from_public_key(&verifying);
        let public_key = verifying.to_encoded_point(false).as_bytes().to_vec();
        Self {
            key,
            address,
            public_key,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Uncompressed SEC1 public key (65 bytes).
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    /// Low-S `r || s` signature over a 32-byte prehash.
    pub fn sign_hash(&self, hash: &Hash) -> Result<Vec<u8>, SignatureError> {
        let signature: Signature = self
            .key
            .sign_prehash(hash)
            .map_err(|_| SignatureError::SigningFailed)?;
        let signature = signature.normalize_s().unwrap_or(signature);
        Ok(signature.to_bytes().to_vec())
    }

    /// Fill in `public_key`, `id` and `signature`. Returns the id.
    ///
    /// Any previous id is discarded and recomputed.
    pub fn sign(&self, tx: &mut Transaction) -> Result<Hash, SignatureError> {
        tx.public_key = self.public_key.clone();
        tx.id = None;
        let id = tx.ensure_id();
        tx.signature = self.sign_hash(&id)?;
        Ok(id)
    }
}
