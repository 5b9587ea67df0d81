//! Bulk encryption and decryption of many items under one shared key.
//!
//! # Guarantees
//!
//! - The result vector has one entry per input and entry `i` always describes
//!   input `i`, whatever order the workers finish in.
//! - A failing item only affects its own entry.
//! - A key of the wrong length is detected once, before any worker starts, and
//!   every entry receives the same [`CipherError::InvalidKeyLength`].
//!
//! The unbounded calls run one worker per item. The `_limited` calls cap the
//! worker count; prefer them for large batches.

pub mod result;
pub mod runner;

pub use result::{BulkError, DecryptionResult, EncryptionResult, Outcome};
pub use runner::{normalize_limit, DEFAULT_CONCURRENCY_LIMIT};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::crypto::{cipher, validate_key, CipherError};

/// Encrypt every item concurrently, one worker per item.
pub fn bulk_encrypt<S>(items: &[S], key: &[u8]) -> Vec<EncryptionResult>
where
    S: AsRef<str> + Sync,
{
    encrypt_with(items, key, items.len(), None)
}

/// Decrypt every envelope concurrently, one worker per item.
pub fn bulk_decrypt<S>(items: &[S], key: &[u8]) -> Vec<DecryptionResult>
where
    S: AsRef<str> + Sync,
{
    decrypt_with(items, key, items.len(), None)
}

/// Encrypt every item with at most `limit` workers (`0` means
/// [`DEFAULT_CONCURRENCY_LIMIT`]).
pub fn bulk_encrypt_limited<S>(items: &[S], key: &[u8], limit: usize) -> Vec<EncryptionResult>
where
    S: AsRef<str> + Sync,
{
    encrypt_with(items, key, normalize_limit(limit), None)
}

/// Decrypt every envelope with at most `limit` workers (`0` means
/// [`DEFAULT_CONCURRENCY_LIMIT`]).
pub fn bulk_decrypt_limited<S>(items: &[S], key: &[u8], limit: usize) -> Vec<DecryptionResult>
where
    S: AsRef<str> + Sync,
{
    decrypt_with(items, key, normalize_limit(limit), None)
}

/// Like [`bulk_encrypt_limited`], but items not yet started when `cancel`
/// fires are reported as [`BulkError::Cancelled`].
pub fn bulk_encrypt_with_cancel<S>(
    items: &[S],
    key: &[u8],
    limit: usize,
    cancel: &CancellationToken,
) -> Vec<EncryptionResult>
where
    S: AsRef<str> + Sync,
{
    encrypt_with(items, key, normalize_limit(limit), Some(cancel))
}

/// Like [`bulk_decrypt_limited`], but items not yet started when `cancel`
/// fires are reported as [`BulkError::Cancelled`].
pub fn bulk_decrypt_with_cancel<S>(
    items: &[S],
    key: &[u8],
    limit: usize,
    cancel: &CancellationToken,
) -> Vec<DecryptionResult>
where
    S: AsRef<str> + Sync,
{
    decrypt_with(items, key, normalize_limit(limit), Some(cancel))
}

fn encrypt_with<S>(
    items: &[S],
    key: &[u8],
    workers: usize,
    cancel: Option<&CancellationToken>,
) -> Vec<EncryptionResult>
where
    S: AsRef<str> + Sync,
{
    let outcomes = dispatch("encrypt", items, key, workers, cancel, |item| {
        cipher::encrypt(item, key)
    });
    items
        .iter()
        .zip(outcomes)
        .map(|(item, outcome)| EncryptionResult::new(item.as_ref(), outcome))
        .collect()
}

fn decrypt_with<S>(
    items: &[S],
    key: &[u8],
    workers: usize,
    cancel: Option<&CancellationToken>,
) -> Vec<DecryptionResult>
where
    S: AsRef<str> + Sync,
{
    let outcomes = dispatch("decrypt", items, key, workers, cancel, |item| {
        cipher::decrypt(item, key)
    });
    items
        .iter()
        .zip(outcomes)
        .map(|(item, outcome)| DecryptionResult::new(item.as_ref(), outcome))
        .collect()
}

fn dispatch<S, F>(
    operation: &'static str,
    items: &[S],
    key: &[u8],
    workers: usize,
    cancel: Option<&CancellationToken>,
    op: F,
) -> Vec<Outcome>
where
    S: AsRef<str> + Sync,
    F: Fn(&str) -> Result<String, CipherError> + Sync,
{
    if let Err(e) = validate_key(key) {
        warn!(operation, items = items.len(), error = %e, "rejecting batch before dispatch");
        return runner::fail_fast(items.len(), &e);
    }

    let outcomes = runner::run_bulk(items, workers, cancel, op);
    let failed = outcomes.iter().filter(|o| o.is_err()).count();
    debug!(operation, items = items.len(), failed, "bulk call completed");
    outcomes
}
