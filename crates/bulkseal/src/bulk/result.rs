//! Per-slot outcomes of a bulk call.

use common::protocol::{DecryptRecord, EncryptRecord, ErrorBody};
use common::FailureKind;
use thiserror::Error;

use crate::crypto::CipherError;

/// Why a single slot of a bulk call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    /// The cipher rejected this item (or the shared key).
    #[error(transparent)]
    Cipher(#[from] CipherError),

    /// The batch was cancelled before a worker reached this item.
    #[error("cancelled before processing")]
    Cancelled,
}

impl BulkError {
    /// Stable classification for batch output.
    ///
    /// Malformed envelopes and authentication failures both map to
    /// [`FailureKind::DecryptFailed`].
    pub fn kind(&self) -> FailureKind {
        match self {
            BulkError::Cipher(CipherError::InvalidKeyLength { .. }) => FailureKind::InvalidKeyLength,
            BulkError::Cipher(CipherError::EmptyInput) => FailureKind::EmptyInput,
            BulkError::Cipher(CipherError::MalformedEnvelope)
            | BulkError::Cipher(CipherError::AuthenticationFailed) => FailureKind::DecryptFailed,
            BulkError::Cipher(CipherError::CipherInitFailed) => FailureKind::CipherInitFailed,
            BulkError::Cipher(CipherError::EntropyUnavailable) => FailureKind::EntropyUnavailable,
            BulkError::Cipher(CipherError::InvalidUtf8) => FailureKind::InvalidUtf8,
            BulkError::Cancelled => FailureKind::Cancelled,
        }
    }

    /// Error body safe to write to batch output.
    pub fn to_body(&self) -> ErrorBody {
        let kind = self.kind();
        let message = match kind {
            // Same text for both causes.
            FailureKind::DecryptFailed => kind.to_string(),
            _ => self.to_string(),
        };
        ErrorBody::new(kind, message)
    }
}

/// What a worker produced for one slot.
pub type Outcome = Result<String, BulkError>;

/// Result of encrypting the item at the same index of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResult {
    /// The plaintext as submitted.
    pub original: String,
    /// The base64 envelope; empty on failure.
    pub encrypted: String,
    /// Set when this item failed.
    pub error: Option<BulkError>,
}

impl EncryptionResult {
    pub(crate) fn new(original: &str, outcome: Outcome) -> Self {
        let (encrypted, error) = split(outcome);
        Self {
            original: original.to_owned(),
            encrypted,
            error,
        }
    }

    /// Returns `true` if this item was encrypted.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert to the JSON-line record for position `index`.
    pub fn to_record(&self, index: usize) -> EncryptRecord {
        EncryptRecord {
            index,
            original: self.original.clone(),
            encrypted: self.is_ok().then(|| self.encrypted.clone()),
            error: self.error.as_ref().map(BulkError::to_body),
        }
    }
}

/// Result of decrypting the envelope at the same index of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecryptionResult {
    /// The envelope as submitted.
    pub encrypted: String,
    /// The recovered plaintext; empty on failure.
    pub decrypted: String,
    /// Set when this item failed.
    pub error: Option<BulkError>,
}

impl DecryptionResult {
    pub(crate) fn new(encrypted: &str, outcome: Outcome) -> Self {
        let (decrypted, error) = split(outcome);
        Self {
            encrypted: encrypted.to_owned(),
            decrypted,
            error,
        }
    }

    /// Returns `true` if this item was decrypted.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Convert to the JSON-line record for position `index`.
    pub fn to_record(&self, index: usize) -> DecryptRecord {
        DecryptRecord {
            index,
            encrypted: self.encrypted.clone(),
            decrypted: self.is_ok().then(|| self.decrypted.clone()),
            error: self.error.as_ref().map(BulkError::to_body),
        }
    }
}

fn split(outcome: Outcome) -> (String, Option<BulkError>) {
    match outcome {
        Ok(output) => (output, None),
        Err(e) => (String::new(), Some(e)),
    }
}
