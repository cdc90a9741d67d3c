use crate::ports::outbound::ChecksumProvider;
use sha2::{Digest, Sha256};

/// SHA-256 checksum provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Checksum;

impl ChecksumProvider for Sha256Checksum {
    fn checksum(&self, data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }
}
