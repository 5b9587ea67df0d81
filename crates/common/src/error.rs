//! Stable failure classification shared by everything that reads batch output.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable classification of a single item's failure.
///
/// Variants serialise as `snake_case` codes, e.g. `"invalid_key_length"`.
/// Malformed envelopes and authentication failures deliberately share
/// [`FailureKind::DecryptFailed`] so that batch output cannot be used to tell
/// a wrong key apart from a corrupted envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The key is not exactly 32 bytes.
    #[error("invalid key length")]
    InvalidKeyLength,

    /// The item was an empty string.
    #[error("input must not be empty")]
    EmptyInput,

    /// The envelope was malformed, tampered with, or sealed under another key.
    #[error("decryption failed")]
    DecryptFailed,

    /// The underlying cipher primitive could not be constructed.
    #[error("cipher initialisation failed")]
    CipherInitFailed,

    /// The OS random source could not supply a nonce.
    #[error("secure random source unavailable")]
    EntropyUnavailable,

    /// The envelope authenticated but its plaintext is not UTF-8 text.
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,

    /// The batch was cancelled before this item was processed.
    #[error("cancelled before processing")]
    Cancelled,
}

impl FailureKind {
    /// Whether resubmitting the same item could succeed.
    ///
    /// Only cancellation and a transient RNG failure qualify; every other kind
    /// fails identically on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Cancelled | FailureKind::EntropyUnavailable
        )
    }
}
