//! AES-256-GCM encryption and decryption of individual items.
//!
//! Every call to [`seal`] draws a fresh 96-bit nonce from the OS CSPRNG, so
//! encrypting the same plaintext twice yields two different envelopes.
//!
//! **Never derive the nonce from the plaintext or a counter shared across
//! processes.** GCM nonce reuse under one key breaks both confidentiality and
//! authentication.

use std::str::FromStr;

use aes_gcm::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the GCM authentication tag appended to the ciphertext.
pub const TAG_LEN: usize = 16;

/// Errors produced by the cipher layer.
///
/// `Clone` so a single key-length failure can be copied into every slot of a
/// bulk result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// The key is the wrong length.
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// The plaintext or envelope was empty.
    #[error("input must not be empty")]
    EmptyInput,

    /// The envelope is not valid base64 or is shorter than a nonce.
    #[error("malformed envelope")]
    MalformedEnvelope,

    /// The tag did not verify: wrong key or tampered envelope.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The AES-GCM instance could not be constructed.
    #[error("cipher initialisation failed")]
    CipherInitFailed,

    /// The OS random source failed to supply a nonce.
    #[error("secure random source unavailable")]
    EntropyUnavailable,

    /// The envelope authenticated but the plaintext is not UTF-8.
    #[error("plaintext is not valid UTF-8")]
    InvalidUtf8,
}

/// A decoded envelope: `nonce || ciphertext || tag`.
///
/// The string form is the standard padded base64 of the concatenated bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext followed by the authentication tag.
    pub sealed: Vec<u8>,
}

impl Envelope {
    /// Concatenate nonce and sealed bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NONCE_LEN + self.sealed.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.sealed);
        out
    }

    /// Split raw envelope bytes into nonce and sealed parts.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedEnvelope`] if `bytes` is shorter than
    /// [`NONCE_LEN`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CipherError> {
        if bytes.len() < NONCE_LEN {
            return Err(CipherError::MalformedEnvelope);
        }
        let (nonce_bytes, sealed) = bytes.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);
        Ok(Self {
            nonce,
            sealed: sealed.to_vec(),
        })
    }

    /// Encode this envelope to its text form.
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = STANDARD
            .decode(s)
            .map_err(|_| CipherError::MalformedEnvelope)?;
        Self::from_bytes(&bytes)
    }
}

/// Reject any key that is not exactly [`KEY_LEN`] bytes.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] carrying the expected and actual
/// lengths.
pub fn validate_key(key: &[u8]) -> Result<(), CipherError> {
    if key.len() != KEY_LEN {
        return Err(CipherError::InvalidKeyLength {
            expected: KEY_LEN,
            actual: key.len(),
        });
    }
    Ok(())
}

/// Seal raw plaintext bytes under `key` with a fresh random nonce.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes,
/// [`CipherError::EmptyInput`] if `plaintext` is empty, and
/// [`CipherError::EntropyUnavailable`] if the OS RNG fails.
pub fn seal(plaintext: &[u8], key: &[u8]) -> Result<Envelope, CipherError> {
    let cipher = build_cipher(key)?;
    if plaintext.is_empty() {
        return Err(CipherError::EmptyInput);
    }

    let mut nonce = [0u8; NONCE_LEN];
    OsRng
        .try_fill_bytes(&mut nonce)
        .map_err(|_| CipherError::EntropyUnavailable)?;

    // No associated data; the tag covers the ciphertext only.
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::CipherInitFailed)?;

    Ok(Envelope { nonce, sealed })
}

/// Open an [`Envelope`] and return the authenticated plaintext bytes.
///
/// # Errors
///
/// Returns [`CipherError::InvalidKeyLength`] if `key` is not [`KEY_LEN`] bytes
/// and [`CipherError::AuthenticationFailed`] if the tag does not verify.
pub fn open(envelope: &Envelope, key: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), envelope.sealed.as_ref())
        .map_err(|_| CipherError::AuthenticationFailed)
}

/// Encrypt a text item and return its base64 envelope.
///
/// # Errors
///
/// See [`seal`].
pub fn encrypt(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    seal(plaintext.as_bytes(), key).map(|envelope| envelope.encode())
}

/// Decrypt a base64 envelope back to the original text.
///
/// Checks run in order: key length, empty input, decoding, authentication.
///
/// # Errors
///
/// Returns [`CipherError::MalformedEnvelope`] for undecodable or short input,
/// [`CipherError::AuthenticationFailed`] for a wrong key or altered envelope,
/// and [`CipherError::InvalidUtf8`] if the plaintext is not text.
pub fn decrypt(envelope: &str, key: &[u8]) -> Result<String, CipherError> {
    validate_key(key)?;
    if envelope.is_empty() {
        return Err(CipherError::EmptyInput);
    }
    let parsed: Envelope = envelope.parse()?;
    let plaintext = open(&parsed, key)?;
    String::from_utf8(plaintext).map_err(|_| CipherError::InvalidUtf8)
}

fn build_cipher(key: &[u8]) -> Result<Aes256Gcm, CipherError> {
    validate_key(key)?;
    Aes256Gcm::new_from_slice(key).map_err(|_| CipherError::CipherInitFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::derive_key;
    use proptest::prelude::*;

    fn random_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn encrypt_decrypt_round_trip() {
        let key = derive_key("Okestro2018@");
        let message = "암호화 해야하는 메시지";
        let envelope = encrypt(message, key.as_bytes()).unwrap();
        assert_eq!(decrypt(&envelope, key.as_bytes()).unwrap(), message);
    }

    #[test]
    fn same_plaintext_gives_different_envelopes() {
        let key = random_key();
        let a = encrypt("hello", &key).unwrap();
        let b = encrypt("hello", &key).unwrap();
        assert_ne!(a, b);
        assert_eq!(decrypt(&a, &key).unwrap(), "hello");
        assert_eq!(decrypt(&b, &key).unwrap(), "hello");
    }

    #[test]
    fn envelope_layout() {
        let key = random_key();
        let envelope = seal(b"hello world", &key).unwrap();
        assert_eq!(envelope.sealed.len(), "hello world".len() + TAG_LEN);
        let decoded = STANDARD.decode(envelope.encode()).unwrap();
        assert_eq!(decoded.len(), NONCE_LEN + 11 + TAG_LEN);
        assert_eq!(&decoded[..NONCE_LEN], &envelope.nonce);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let envelope = encrypt("secret", &random_key()).unwrap();
        assert_eq!(
            decrypt(&envelope, &random_key()),
            Err(CipherError::AuthenticationFailed)
        );
    }

    #[test]
    fn invalid_key_length_reports_sizes() {
        let short_key = b"too-short-key";
        assert_eq!(
            encrypt("x", short_key),
            Err(CipherError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: 13
            })
        );
        assert_eq!(
            decrypt("AAAA", &[0u8; 33]),
            Err(CipherError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: 33
            })
        );
    }

    #[test]
    fn empty_key_is_rejected() {
        let key = derive_key("");
        assert_eq!(
            encrypt("x", key.as_bytes()),
            Err(CipherError::InvalidKeyLength {
                expected: KEY_LEN,
                actual: 0
            })
        );
    }

    #[test]
    fn empty_input_rejected() {
        let key = random_key();
        assert_eq!(encrypt("", &key), Err(CipherError::EmptyInput));
        assert_eq!(decrypt("", &key), Err(CipherError::EmptyInput));
    }

    #[test]
    fn undecodable_envelope_is_malformed() {
        let key = random_key();
        assert_eq!(decrypt("!!!not base64", &key), Err(CipherError::MalformedEnvelope));
    }

    #[test]
    fn envelope_shorter_than_nonce_is_malformed() {
        let key = random_key();
        let short = STANDARD.encode([0u8; NONCE_LEN - 1]);
        assert_eq!(decrypt(&short, &key), Err(CipherError::MalformedEnvelope));
    }

    #[test]
    fn nonce_only_envelope_fails_authentication() {
        let key = random_key();
        let bare = STANDARD.encode([0u8; NONCE_LEN]);
        assert_eq!(decrypt(&bare, &key), Err(CipherError::AuthenticationFailed));
    }

    #[test]
    fn non_utf8_plaintext_is_reported() {
        let key = random_key();
        let envelope = seal(&[0xff, 0xfe, 0xfd], &key).unwrap().encode();
        assert_eq!(decrypt(&envelope, &key), Err(CipherError::InvalidUtf8));
    }

    #[test]
    fn from_str_round_trip() {
        let key = random_key();
        let envelope = seal(b"hello", &key).unwrap();
        let parsed: Envelope = envelope.encode().parse().unwrap();
        assert_eq!(parsed, envelope);
        assert_eq!(open(&parsed, &key).unwrap(), b"hello");
    }

    proptest! {
        #[test]
        fn prop_round_trip(plaintext in ".{1,256}") {
            let key = derive_key("proptest-secret");
            let envelope = encrypt(&plaintext, key.as_bytes()).unwrap();
            prop_assert_eq!(decrypt(&envelope, key.as_bytes()).unwrap(), plaintext);
        }

        #[test]
        fn prop_any_flipped_byte_is_detected(
            plaintext in "[a-z ]{1,64}",
            position in any::<prop::sample::Index>(),
            mask in 1u8..=255,
        ) {
            let key = derive_key("proptest-secret");
            let mut bytes = seal(plaintext.as_bytes(), key.as_bytes()).unwrap().to_bytes();
            let i = position.index(bytes.len());
            bytes[i] ^= mask;
            let tampered = STANDARD.encode(&bytes);
            prop_assert_eq!(
                decrypt(&tampered, key.as_bytes()),
                Err(CipherError::AuthenticationFailed)
            );
        }
    }
}
