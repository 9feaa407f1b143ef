//! Token format for sealed values.
//!
//! A token is the only thing that leaves the cipher. Its raw layout is:
//!
//! ```text
//! [version:1][issued_at:8][nonce:24][ciphertext || tag:16]
//! ```
//!
//! `issued_at` is big-endian unix seconds. The first 33 bytes form the
//! header and are authenticated as associated data. The whole byte string
//! is encoded as URL-safe base64 so it can be stored as a plain text field.

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Token format version.
pub const TOKEN_VERSION: u8 = 1;

/// Nonce size for XChaCha20-Poly1305 (192 bits).
pub const NONCE_SIZE: usize = 24;

/// Poly1305 tag size.
pub const TAG_SIZE: usize = 16;

/// Size of the authenticated header: version, timestamp, nonce.
pub const HEADER_SIZE: usize = 1 + 8 + NONCE_SIZE;

/// An opaque, printable, self-contained sealed value.
///
/// Only the cipher looks inside a token. Everything else treats it as an
/// atomic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wraps a string received from storage as a token.
    ///
    /// No validation happens here; a malformed token is rejected when it is
    /// decrypted.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the token length in characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the token text is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns at most the first `chars` characters, for display.
    #[must_use]
    pub fn preview(&self, chars: usize) -> &str {
        // base64 text is ASCII, so byte and char boundaries agree
        let end = self.0.len().min(chars);
        self.0.get(..end).unwrap_or(&self.0)
    }

    /// Consumes the token and returns its text.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Authenticated header carried at the front of every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TokenHeader {
    version: u8,
    issued_at: u64,
    nonce: [u8; NONCE_SIZE],
}

impl TokenHeader {
    pub(crate) const fn new(issued_at: u64, nonce: [u8; NONCE_SIZE]) -> Self {
        Self { version: TOKEN_VERSION, issued_at, nonce }
    }

    pub(crate) const fn issued_at(&self) -> u64 {
        self.issued_at
    }

    pub(crate) const fn nonce(&self) -> &[u8; NONCE_SIZE] {
        &self.nonce
    }

    pub(crate) fn to_bytes(self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0] = self.version;
        bytes[1..9].copy_from_slice(&self.issued_at.to_be_bytes());
        bytes[9..].copy_from_slice(&self.nonce);
        bytes
    }

    fn from_bytes(data: &[u8; HEADER_SIZE]) -> Result<Self, Error> {
        let version = data[0];
        if version != TOKEN_VERSION {
            return Err(Error::UnsupportedVersion {
                version,
                supported: TOKEN_VERSION.to_string(),
            });
        }

        let mut issued_at = [0u8; 8];
        issued_at.copy_from_slice(&data[1..9]);
        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&data[9..]);

        Ok(Self { version, issued_at: u64::from_be_bytes(issued_at), nonce })
    }
}

/// Splits a raw token into its header and sealed body.
pub(crate) struct RawToken {
    bytes: Vec<u8>,
    header: TokenHeader,
}

impl RawToken {
    /// Joins a header and AEAD output and encodes the result.
    pub(crate) fn seal(header: TokenHeader, sealed: &[u8]) -> Token {
        let mut bytes = Vec::with_capacity(HEADER_SIZE + sealed.len());
        bytes.extend_from_slice(&header.to_bytes());
        bytes.extend_from_slice(sealed);
        Token(URL_SAFE.encode(bytes))
    }

    /// Decodes a token and parses its header.
    pub(crate) fn parse(token: &Token) -> Result<Self, Error> {
        let bytes = URL_SAFE
            .decode(token.as_str().trim())
            .map_err(|e| Error::MalformedToken(format!("not valid base64: {e}")))?;

        if bytes.len() < HEADER_SIZE + TAG_SIZE {
            return Err(Error::MalformedToken(format!(
                "too short: {} bytes (min: {})",
                bytes.len(),
                HEADER_SIZE + TAG_SIZE
            )));
        }

        let mut raw_header = [0u8; HEADER_SIZE];
        raw_header.copy_from_slice(&bytes[..HEADER_SIZE]);
        let header = TokenHeader::from_bytes(&raw_header)?;

        Ok(Self { bytes, header })
    }

    pub(crate) const fn header(&self) -> &TokenHeader {
        &self.header
    }

    pub(crate) fn header_bytes(&self) -> &[u8] {
        &self.bytes[..HEADER_SIZE]
    }

    pub(crate) fn sealed(&self) -> &[u8] {
        &self.bytes[HEADER_SIZE..]
    }
}
