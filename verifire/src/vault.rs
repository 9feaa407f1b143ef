//! Vault for sealing and opening tokens.
//!
//! The Vault performs authenticated encryption with XChaCha20-Poly1305 under
//! a borrowed [`Key`]. Every call draws a fresh random nonce, so sealing the
//! same plaintext twice yields two different tokens.

use chacha20poly1305::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng, Payload},
    XChaCha20Poly1305, XNonce,
};
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::canonical;
use crate::error::Error;
use crate::key::Key;
use crate::token::{RawToken, Token, TokenHeader, NONCE_SIZE};

/// How far in the future a token's timestamp may lie before it is rejected
/// by [`Vault::decrypt_with_ttl`].
pub const MAX_CLOCK_SKEW_SECS: u64 = 60;

/// Vault for encryption and decryption operations.
///
/// A `Vault` only borrows its key for as long as it lives and keeps no other
/// state, so it is cheap to create per call site and safe to share across
/// threads.
///
/// # Example
///
/// ```
/// use verifire::key::Key;
/// use verifire::vault::Vault;
///
/// # fn main() -> Result<(), verifire::error::Error> {
/// let key = Key::generate();
/// let vault = Vault::new(&key);
///
/// let token = vault.encrypt(b"A1234567")?;
/// let plaintext = vault.decrypt(&token)?;
///
/// assert_eq!(plaintext, b"A1234567");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Vault<'k> {
    key: &'k Key,
}

impl<'k> Vault<'k> {
    /// Creates a vault that seals and opens tokens with `key`.
    #[must_use]
    pub const fn new(key: &'k Key) -> Self {
        Self { key }
    }

    /// Encrypts plaintext into a token.
    ///
    /// # Errors
    ///
    /// Returns `Error::EncryptionFailed` if the cipher rejects the input.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Token, Error> {
        self.encrypt_at(plaintext, unix_now())
    }

    pub(crate) fn encrypt_at(&self, plaintext: &[u8], issued_at: u64) -> Result<Token, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);

        let header = TokenHeader::new(issued_at, nonce_bytes);
        let aad = header.to_bytes();

        let sealed = self
            .cipher()?
            .encrypt(XNonce::from_slice(&nonce_bytes), Payload { msg: plaintext, aad: &aad })
            .map_err(|e| {
                Error::EncryptionFailed(format!("XChaCha20-Poly1305 encryption failed: {e}"))
            })?;

        Ok(RawToken::seal(header, &sealed))
    }

    /// Decrypts a token back to the exact bytes that were sealed.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthenticationFailed` if the token was tampered with,
    /// is corrupted, or was sealed under another key. An unknown version byte
    /// on a token of plausible length counts as corruption. Returns
    /// `Error::MalformedToken` if the input is not token-shaped.
    pub fn decrypt(&self, token: &Token) -> Result<Vec<u8>, Error> {
        let raw = parse(token)?;
        self.open(&raw)
    }

    /// Decrypts a token, rejecting it if it was issued more than `ttl` ago.
    ///
    /// The age check runs only after the token authenticates, so a forged
    /// timestamp is reported as `Error::AuthenticationFailed`.
    ///
    /// # Errors
    ///
    /// As [`Vault::decrypt`], plus `Error::TokenExpired` when the token is
    /// too old. A timestamp more than [`MAX_CLOCK_SKEW_SECS`] in the future
    /// is treated as an authentication failure.
    pub fn decrypt_with_ttl(&self, token: &Token, ttl: Duration) -> Result<Vec<u8>, Error> {
        self.decrypt_with_ttl_at(token, ttl, unix_now())
    }

    pub(crate) fn decrypt_with_ttl_at(
        &self,
        token: &Token,
        ttl: Duration,
        now: u64,
    ) -> Result<Vec<u8>, Error> {
        let raw = parse(token)?;
        let plaintext = self.open(&raw)?;

        let issued_at = raw.header().issued_at();
        if issued_at > now.saturating_add(MAX_CLOCK_SKEW_SECS) {
            return Err(Error::AuthenticationFailed);
        }

        let age_secs = now.saturating_sub(issued_at);
        let ttl_secs = ttl.as_secs();
        if age_secs > ttl_secs {
            return Err(Error::TokenExpired { age_secs, ttl_secs });
        }

        Ok(plaintext)
    }

    /// Decrypts every token independently.
    ///
    /// One bad token does not stop the batch; each position in the output
    /// holds the result for the token at the same position.
    pub fn decrypt_all<'t, I>(&self, tokens: I) -> Vec<Result<Vec<u8>, Error>>
    where
        I: IntoIterator<Item = &'t Token>,
    {
        tokens
            .into_iter()
            .enumerate()
            .map(|(index, token)| {
                self.decrypt(token).map_err(|e| {
                    warn!(index, error = %e, "token rejected");
                    e
                })
            })
            .collect()
    }

    /// Canonicalizes `value` and seals it.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` if the value cannot be serialized,
    /// or any error from [`Vault::encrypt`].
    pub fn encrypt_value<T: Serialize + ?Sized>(&self, value: &T) -> Result<Token, Error> {
        let bytes = zeroize::Zeroizing::new(canonical::encode(value)?);
        self.encrypt(&bytes)
    }

    /// Opens a token and parses its canonical payload.
    ///
    /// # Errors
    ///
    /// Any error from [`Vault::decrypt`], or `Error::MalformedPayload` if the
    /// authenticated bytes are not canonical output for `T`.
    pub fn decrypt_value<T: DeserializeOwned>(&self, token: &Token) -> Result<T, Error> {
        let bytes = zeroize::Zeroizing::new(self.decrypt(token)?);
        canonical::decode(&bytes)
    }

    fn open(&self, raw: &RawToken) -> Result<Vec<u8>, Error> {
        self.cipher()?
            .decrypt(
                XNonce::from_slice(raw.header().nonce()),
                Payload { msg: raw.sealed(), aad: raw.header_bytes() },
            )
            .map_err(|_| Error::AuthenticationFailed)
    }

    fn cipher(&self) -> Result<XChaCha20Poly1305, Error> {
        XChaCha20Poly1305::new_from_slice(self.key.expose())
            .map_err(|e| Error::EncryptionFailed(format!("Invalid key: {e}")))
    }
}

// An unknown version byte on a well-sized token is indistinguishable from a
// wrong key.
fn parse(token: &Token) -> Result<RawToken, Error> {
    RawToken::parse(token).map_err(|e| match e {
        Error::UnsupportedVersion { version, .. } => {
            debug!(version, "token carries an unknown version byte");
            Error::AuthenticationFailed
        }
        other => other,
    })
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE, Engine as _};
    use crate::token::{HEADER_SIZE, TAG_SIZE};

    fn test_key() -> Key {
        Key::from_bytes(&[42u8; 32]).unwrap()
    }

    fn flip_byte(token: &Token, index: usize) -> Token {
        let mut bytes = URL_SAFE.decode(token.as_str()).unwrap();
        bytes[index] ^= 0x01;
        Token::new(URL_SAFE.encode(bytes))
    }

    #[test]
    fn test_vault_encrypt_decrypt_round_trip() {
        let key = test_key();
        let vault = Vault::new(&key);

        let plaintext = b"A1234567";
        let token = vault.encrypt(plaintext).expect("Encryption failed");
        let decrypted = vault.decrypt(&token).expect("Decryption failed");

        assert_eq!(plaintext, &decrypted[..]);
    }

    #[test]
    fn test_vault_encrypt_is_not_deterministic() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token1 = vault.encrypt(b"A1234567").unwrap();
        let token2 = vault.encrypt(b"A1234567").unwrap();

        // Fresh nonce per call
        assert_ne!(token1, token2);
        assert_eq!(vault.decrypt(&token1).unwrap(), vault.decrypt(&token2).unwrap());
    }

    #[test]
    fn test_vault_wrong_key_fails() {
        let key1 = test_key();
        let key2 = Key::from_bytes(&[7u8; 32]).unwrap();

        let token = Vault::new(&key1).encrypt(b"A1234567").unwrap();
        let result = Vault::new(&key2).decrypt(&token);

        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_vault_every_body_byte_is_authenticated() {
        let key = test_key();
        let vault = Vault::new(&key);
        let token = vault.encrypt(b"A1234567").unwrap();
        let raw_len = URL_SAFE.decode(token.as_str()).unwrap().len();

        assert_eq!(raw_len, HEADER_SIZE + 8 + TAG_SIZE);
        for index in HEADER_SIZE..raw_len {
            let tampered = flip_byte(&token, index);
            assert!(
                matches!(vault.decrypt(&tampered), Err(Error::AuthenticationFailed)),
                "flip at byte {index} must fail authentication"
            );
        }
    }

    #[test]
    fn test_vault_header_is_authenticated() {
        let key = test_key();
        let vault = Vault::new(&key);
        let token = vault.encrypt(b"A1234567").unwrap();

        for index in 0..HEADER_SIZE {
            let tampered = flip_byte(&token, index);
            assert!(
                matches!(vault.decrypt(&tampered), Err(Error::AuthenticationFailed)),
                "flip at header byte {index} must fail authentication"
            );
        }
    }

    #[test]
    fn test_vault_version_flip_looks_like_wrong_key() {
        let key = test_key();
        let other = Key::from_bytes(&[7u8; 32]).unwrap();
        let token = Vault::new(&key).encrypt(b"A1234567").unwrap();

        let corrupted = Vault::new(&key).decrypt(&flip_byte(&token, 0));
        let wrong_key = Vault::new(&other).decrypt(&token);

        assert!(matches!(corrupted, Err(Error::AuthenticationFailed)));
        assert!(matches!(wrong_key, Err(Error::AuthenticationFailed)));

        let ttl = Duration::from_secs(60);
        let result = Vault::new(&key).decrypt_with_ttl(&flip_byte(&token, 0), ttl);
        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_vault_malformed_input_is_typed() {
        let key = test_key();
        let vault = Vault::new(&key);

        let result = vault.decrypt(&Token::new("definitely-not-a-token"));
        assert!(matches!(result, Err(Error::MalformedToken(_))));
        assert!(result.unwrap_err().is_token_rejection());

        let result = vault.decrypt(&Token::new(""));
        assert!(matches!(result, Err(Error::MalformedToken(_))));
    }

    #[test]
    fn test_vault_empty_plaintext() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt(b"").unwrap();
        assert!(vault.decrypt(&token).unwrap().is_empty());
    }

    #[test]
    fn test_vault_large_plaintext() {
        let key = test_key();
        let vault = Vault::new(&key);

        let plaintext = vec![42u8; 10000];
        let token = vault.encrypt(&plaintext).unwrap();

        assert_eq!(vault.decrypt(&token).unwrap(), plaintext);
    }

    #[test]
    fn test_vault_ttl_accepts_fresh_token() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt_at(b"A1234567", 1_000).unwrap();
        let result = vault.decrypt_with_ttl_at(&token, Duration::from_secs(60), 1_030);

        assert_eq!(result.unwrap(), b"A1234567");
    }

    #[test]
    fn test_vault_ttl_rejects_old_token() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt_at(b"A1234567", 1_000).unwrap();
        let result = vault.decrypt_with_ttl_at(&token, Duration::from_secs(60), 1_100);

        assert!(matches!(result, Err(Error::TokenExpired { age_secs: 100, ttl_secs: 60 })));
        // Plain decrypt ignores age
        assert!(vault.decrypt(&token).is_ok());
    }

    #[test]
    fn test_vault_ttl_rejects_future_token() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt_at(b"A1234567", 10_000).unwrap();
        let result = vault.decrypt_with_ttl_at(&token, Duration::from_secs(60), 1_000);

        assert!(matches!(result, Err(Error::AuthenticationFailed)));
    }

    #[test]
    fn test_vault_decrypt_all_continues_past_bad_token() {
        let key = test_key();
        let vault = Vault::new(&key);

        let good1 = vault.encrypt(b"first").unwrap();
        let bad = flip_byte(&good1, HEADER_SIZE);
        let good2 = vault.encrypt(b"second").unwrap();

        let results = vault.decrypt_all([&good1, &bad, &good2]);

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].as_deref().unwrap(), b"first");
        assert!(matches!(results[1], Err(Error::AuthenticationFailed)));
        assert_eq!(results[2].as_deref().unwrap(), b"second");
    }

    #[test]
    fn test_vault_value_round_trip() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt_value("A1234567").unwrap();
        let value: String = vault.decrypt_value(&token).unwrap();

        assert_eq!(value, "A1234567");
    }

    #[test]
    fn test_vault_value_wrong_shape_is_malformed_payload() {
        let key = test_key();
        let vault = Vault::new(&key);

        let token = vault.encrypt(b"\xFF\xFE not canonical").unwrap();
        let result = vault.decrypt_value::<String>(&token);

        assert!(matches!(result, Err(Error::MalformedPayload(_))));
    }

    #[test]
    fn test_vault_is_copy() {
        let key = test_key();
        let vault1 = Vault::new(&key);
        let vault2 = vault1;

        let token = vault1.encrypt(b"test").unwrap();
        assert_eq!(vault2.decrypt(&token).unwrap(), b"test");
    }
}
