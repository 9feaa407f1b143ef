//! Error types for `Verifire` operations.

use std::fmt;

/// Main error type for `Verifire` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Encryption operation failed
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    /// Authentication tag verification failed.
    ///
    /// A wrong key, a corrupted token and a tampered token all land here and
    /// cannot be told apart.
    #[error("authentication failed: token is corrupted, tampered, or sealed under another key")]
    AuthenticationFailed,

    /// Input is not shaped like a token at all
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Unsupported token format version
    #[error("unsupported token version: {version} (supported: {supported})")]
    UnsupportedVersion {
        /// The version found in the token
        version: u8,
        /// Supported versions
        supported: String,
    },

    /// Token authenticated but is older than the accepted TTL
    #[error("token expired: issued {age_secs}s ago (ttl: {ttl_secs}s)")]
    TokenExpired {
        /// Seconds elapsed since the token was issued
        age_secs: u64,
        /// Maximum accepted age
        ttl_secs: u64,
    },

    /// Decrypted bytes are not valid canonical output
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Key store operation failed
    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    /// Every drawn identifier was already taken
    #[error("no free identifier after {attempts} attempts")]
    IdentifierExhausted {
        /// Number of identifiers drawn
        attempts: usize,
    },
}

impl Error {
    /// Returns `true` when a token was rejected and its plaintext cannot be recovered
    /// (wrong key, corruption, tampering, non-token input).
    #[must_use]
    pub const fn is_token_rejection(&self) -> bool {
        matches!(
            self,
            Self::AuthenticationFailed | Self::MalformedToken(_) | Self::UnsupportedVersion { .. }
        )
    }
}

/// Errors specific to key store operations.
#[derive(Debug)]
pub enum KeyStoreError {
    /// Key material exists but the cipher suite rejects it
    KeyFormat(String),

    /// Key creation failed
    CreationFailed(String),

    /// I/O operation failed
    Io(std::io::Error),
}

impl fmt::Display for KeyStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFormat(msg) => write!(f, "invalid key format: {msg}"),
            Self::CreationFailed(msg) => write!(f, "key creation failed: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for KeyStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for KeyStoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
