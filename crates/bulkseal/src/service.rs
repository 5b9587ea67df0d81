//! [`BulkSealer`]: a key plus explicit options, shared by every batch a
//! process runs.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::bulk::{self, DecryptionResult, EncryptionResult, DEFAULT_CONCURRENCY_LIMIT};
use crate::crypto::{derive_key, SymmetricKey};

/// Options applied to every batch a [`BulkSealer`] runs.
#[derive(Debug, Clone)]
pub struct SealerOptions {
    /// Maximum number of concurrent cipher operations. `0` means
    /// [`DEFAULT_CONCURRENCY_LIMIT`].
    pub concurrency_limit: usize,
    /// When set, items not yet started once the token fires are reported as
    /// cancelled instead of processed.
    pub cancel: Option<CancellationToken>,
}

impl Default for SealerOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            cancel: None,
        }
    }
}

/// Runs bounded bulk encrypt/decrypt calls under one shared key.
///
/// Cheap to clone; the key is `Arc`-backed and never mutated.
#[derive(Debug, Clone)]
pub struct BulkSealer {
    key: Arc<SymmetricKey>,
    options: SealerOptions,
}

impl BulkSealer {
    /// Create a sealer for an existing key.
    pub fn new(key: SymmetricKey, options: SealerOptions) -> Self {
        Self {
            key: Arc::new(key),
            options,
        }
    }

    /// Create a sealer whose key is derived from `secret`.
    pub fn from_secret(secret: &str, options: SealerOptions) -> Self {
        Self::new(derive_key(secret), options)
    }

    /// Encrypt a batch on the calling thread's worker pool.
    pub fn encrypt_all<S>(&self, items: &[S]) -> Vec<EncryptionResult>
    where
        S: AsRef<str> + Sync,
    {
        let key = self.key.as_bytes();
        let limit = self.options.concurrency_limit;
        match &self.options.cancel {
            Some(token) => bulk::bulk_encrypt_with_cancel(items, key, limit, token),
            None => bulk::bulk_encrypt_limited(items, key, limit),
        }
    }

    /// Decrypt a batch on the calling thread's worker pool.
    pub fn decrypt_all<S>(&self, items: &[S]) -> Vec<DecryptionResult>
    where
        S: AsRef<str> + Sync,
    {
        let key = self.key.as_bytes();
        let limit = self.options.concurrency_limit;
        match &self.options.cancel {
            Some(token) => bulk::bulk_decrypt_with_cancel(items, key, limit, token),
            None => bulk::bulk_decrypt_limited(items, key, limit),
        }
    }

    /// Encrypt a batch on Tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panicked or was aborted.
    pub async fn encrypt_all_async(&self, items: Vec<String>) -> Result<Vec<EncryptionResult>> {
        let sealer = self.clone();
        tokio::task::spawn_blocking(move || sealer.encrypt_all(&items))
            .await
            .context("bulk encrypt task failed")
    }

    /// Decrypt a batch on Tokio's blocking pool.
    ///
    /// # Errors
    ///
    /// Returns an error only if the blocking task panicked or was aborted.
    pub async fn decrypt_all_async(&self, items: Vec<String>) -> Result<Vec<DecryptionResult>> {
        let sealer = self.clone();
        tokio::task::spawn_blocking(move || sealer.decrypt_all(&items))
            .await
            .context("bulk decrypt task failed")
    }
}
