//! The symmetric key that seals every token.
//!
//! A [`Key`] is 32 bytes of XChaCha20-Poly1305 key material. At rest it is
//! kept as URL-safe base64 text so the key file stays printable and can be
//! copied into a backup by hand.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chacha20poly1305::aead::{rand_core::RngCore, OsRng};
use secrecy::{ExposeSecret, SecretVec};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::KeyStoreError;

/// Key size in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Length of the base64 text form of a key.
pub const ENCODED_KEY_LEN: usize = 44;

/// Symmetric key used for every encrypt/decrypt pair.
///
/// The bytes are held in a [`SecretVec`] so they are zeroized on drop and
/// never show up in `Debug` output.
pub struct Key {
    bytes: SecretVec<u8>,
}

impl Key {
    /// Generates a fresh random key from the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = vec![0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes: SecretVec::new(bytes) }
    }

    /// Builds a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `KeyStoreError::KeyFormat` if `bytes` is not exactly
    /// [`KEY_SIZE`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyStoreError> {
        if bytes.len() != KEY_SIZE {
            return Err(KeyStoreError::KeyFormat(format!(
                "expected {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self { bytes: SecretVec::new(bytes.to_vec()) })
    }

    /// Parses the persisted text form of a key.
    ///
    /// Leading and trailing whitespace is ignored so a key file edited
    /// by hand (trailing newline) still loads.
    ///
    /// # Errors
    ///
    /// Returns `KeyStoreError::KeyFormat` if the text is not base64 or does
    /// not decode to [`KEY_SIZE`] bytes.
    pub fn from_encoded(encoded: &[u8]) -> Result<Self, KeyStoreError> {
        let text = std::str::from_utf8(encoded)
            .map_err(|_| KeyStoreError::KeyFormat("key is not UTF-8 text".to_string()))?;
        let raw = Zeroizing::new(
            URL_SAFE
                .decode(text.trim())
                .map_err(|e| KeyStoreError::KeyFormat(format!("key is not valid base64: {e}")))?,
        );
        Self::from_bytes(&raw)
    }

    /// Returns the persisted text form of the key.
    #[must_use]
    pub fn encode(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(self.bytes.expose_secret()))
    }

    /// Returns a short, non-secret fingerprint for logs and diagnostics.
    ///
    /// First 8 bytes of `SHA-256(key)`, hex encoded.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.bytes.expose_secret());
        hex::encode(&digest[..8])
    }

    pub(crate) fn expose(&self) -> &[u8] {
        self.bytes.expose_secret()
    }
}

impl Clone for Key {
    fn clone(&self) -> Self {
        Self { bytes: SecretVec::new(self.bytes.expose_secret().clone()) }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.bytes.expose_secret() == other.bytes.expose_secret()
    }
}

impl Eq for Key {}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key").field("fingerprint", &self.fingerprint()).finish()
    }
}
