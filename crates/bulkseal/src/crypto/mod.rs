//! AES-256-GCM item encryption primitives.
//!
//! This module has no knowledge of batches or threads. It provides the
//! single-item operations the bulk engines call for every slot.
//!
//! # Envelope format
//!
//! ```text
//! base64( nonce(12) || ciphertext(len = plaintext) || tag(16) )
//! ```
//!
//! Standard alphabet with padding. There is no version byte, so envelopes stay
//! readable by any AES-256-GCM implementation that splits off a 12-byte nonce.

pub mod cipher;
pub mod key;

pub use cipher::{decrypt, encrypt, validate_key, CipherError, Envelope, KEY_LEN, NONCE_LEN};
pub use key::{derive_key, SymmetricKey};
