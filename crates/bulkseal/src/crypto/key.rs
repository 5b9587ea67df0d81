//! [`SymmetricKey`]: in-memory key bytes and the secret-to-key derivation.

use sha2::{Digest, Sha256};

use super::cipher::KEY_LEN;

/// Key material held in memory for the lifetime of a batch.
///
/// A key built by [`derive_key`] is always [`KEY_LEN`] bytes, except for the
/// empty key produced from an empty secret, which every cipher operation
/// rejects. When this type is dropped the bytes are overwritten with zeroes.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey(Vec<u8>);

impl SymmetricKey {
    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        write!(f, "SymmetricKey([REDACTED; {}])", self.0.len())
    }
}

/// Derive a [`KEY_LEN`]-byte key from an arbitrary secret string.
///
/// The key is the SHA-256 digest of the secret's UTF-8 bytes, so the same
/// secret always yields the same key. An empty secret yields an empty key.
pub fn derive_key(secret: &str) -> SymmetricKey {
    if secret.is_empty() {
        return SymmetricKey(Vec::new());
    }
    SymmetricKey(Sha256::digest(secret.as_bytes()).to_vec())
}
