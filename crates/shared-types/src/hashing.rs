//! # Hashing Primitives
//!
//! Keccak-256 helpers used for order IDs, poster digests and the
//! deterministic state hash agreed on by consensus.

use sha3::{Digest, Keccak256};

use crate::entities::{Address, Hash, U256};

/// Keccak-256 of a byte slice.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Incremental hasher for state commitments.
///
/// Every field is written with a fixed-width big-endian encoding and
/// variable-length sections are length-prefixed, so two states hash equal
/// only if they are field-for-field equal.
pub struct StateHasher {
    inner: Keccak256,
}

impl StateHasher {
    /// Start a commitment under a domain tag.
    pub fn new(domain: &str) -> Self {
        let mut inner = Keccak256::new();
        inner.update((domain.len() as u64).to_be_bytes());
        inner.update(domain.as_bytes());
        Self { inner }
    }

    /// Write a u64.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.inner.update(value.to_be_bytes());
        self
    }

    /// Write a 256-bit amount.
    pub fn u256(&mut self, value: &U256) -> &mut Self {
        let mut word = [0u8; 32];
        value.to_big_endian(&mut word);
        self.inner.update(word);
        self
    }

    /// Write an address.
    pub fn address(&mut self, address: &Address) -> &mut Self {
        self.inner.update(address.as_bytes());
        self
    }

    /// Write a length-prefixed byte string.
    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update((data.len() as u64).to_be_bytes());
        self.inner.update(data);
        self
    }

    /// Finish and return the hash.
    pub fn finish(self) -> Hash {
        let result = self.inner.finalize();
        let mut hash = [0u8; 32];
        hash.copy_from_slice(&result);
        hash
    }
}
