//! Bulk AES-256-GCM encryption of many independent items under one key.
//!
//! - [`crypto`]: key derivation and the single-item cipher.
//! - [`bulk`]: unbounded and bounded-concurrency bulk engines with
//!   index-aligned, per-item results.
//! - [`service`]: [`BulkSealer`], a key plus explicit options, with sync and
//!   Tokio entry points.
//! - [`batch`], [`config`], [`telemetry`]: the pieces the `bulkseal` binary is
//!   assembled from.

pub mod batch;
pub mod bulk;
pub mod config;
pub mod crypto;
pub mod service;
pub mod telemetry;

pub use bulk::{
    bulk_decrypt, bulk_decrypt_limited, bulk_decrypt_with_cancel, bulk_encrypt,
    bulk_encrypt_limited, bulk_encrypt_with_cancel, BulkError, DecryptionResult,
    EncryptionResult,
};
pub use crypto::{decrypt, derive_key, encrypt, CipherError, SymmetricKey, KEY_LEN};
pub use service::{BulkSealer, SealerOptions};
