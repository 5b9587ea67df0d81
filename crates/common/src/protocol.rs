//! Record types written by the batch CLI, one JSON object per line.
//!
//! Records are emitted in input order; `index` is the zero-based position of
//! the item in the input batch.

use serde::{Deserialize, Serialize};

use crate::error::FailureKind;

// ---------------------------------------------------------------------------
// Per-item records
// ---------------------------------------------------------------------------

/// Outcome of encrypting one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptRecord {
    /// Position of the item in the input batch.
    pub index: usize,
    /// The plaintext as submitted.
    pub original: String,
    /// The base64 envelope, absent on failure.
    pub encrypted: Option<String>,
    /// Failure details, absent on success.
    pub error: Option<ErrorBody>,
}

/// Outcome of decrypting one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptRecord {
    /// Position of the item in the input batch.
    pub index: usize,
    /// The envelope as submitted.
    pub encrypted: String,
    /// The recovered plaintext, absent on failure.
    pub decrypted: Option<String>,
    /// Failure details, absent on success.
    pub error: Option<ErrorBody>,
}

// ---------------------------------------------------------------------------
// Error body
// ---------------------------------------------------------------------------

/// Failure attached to a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable classification.
    pub code: FailureKind,
    /// Human-readable description. Never contains item content or key material.
    pub message: String,
}

impl ErrorBody {
    /// Construct an [`ErrorBody`] from a kind and message.
    pub fn new(code: FailureKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Batch summary
// ---------------------------------------------------------------------------

/// Totals for one batch, logged once the batch completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Number of items submitted.
    pub total: usize,
    /// Number of items that succeeded.
    pub succeeded: usize,
    /// Number of items that failed, cancellations included.
    pub failed: usize,
    /// Failed items that could succeed if resubmitted.
    pub retryable: usize,
    /// Items skipped because the batch was cancelled.
    pub cancelled: usize,
}

impl BatchSummary {
    /// Count one item's outcome; `failure` is `None` on success.
    pub fn record(&mut self, failure: Option<FailureKind>) {
        self.total += 1;
        let Some(kind) = failure else {
            self.succeeded += 1;
            return;
        };
        self.failed += 1;
        if kind.is_retryable() {
            self.retryable += 1;
        }
        if kind == FailureKind::Cancelled {
            self.cancelled += 1;
        }
    }

    /// Returns `true` if no item was skipped by cancellation.
    pub fn is_complete(&self) -> bool {
        self.cancelled == 0
    }
}
