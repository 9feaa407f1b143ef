//! Key store abstraction for key custody.

use crate::error::KeyStoreError;
use crate::key::Key;

/// How [`KeyStore::ensure_key_with_origin`] obtained the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrigin {
    /// An existing key was read back unchanged.
    Loaded,
    /// No key existed, so a fresh one was generated and persisted.
    Generated,
}

/// Owns the lifecycle of the single deployment key.
///
/// Implementations load the key if it exists and otherwise generate and
/// persist it exactly once. They never rotate, overwrite or delete a key.
///
/// Implementations must be thread-safe (`Send + Sync`) so a store can be
/// shared by a host that runs several workers.
///
/// # Example
///
/// ```rust,ignore
/// use verifire::key_store::{KeyOrigin, KeyStore};
///
/// struct MyStore;
///
/// impl KeyStore for MyStore {
///     fn ensure_key_with_origin(&self) -> Result<(Key, KeyOrigin), KeyStoreError> {
///         // Implementation
///     }
/// }
/// ```
pub trait KeyStore: Send + Sync {
    /// Returns the deployment key together with where it came from.
    ///
    /// # Errors
    ///
    /// Returns `KeyStoreError::KeyFormat` if stored key material exists but
    /// is unusable, `KeyStoreError::Io` if the backing storage fails.
    fn ensure_key_with_origin(&self) -> Result<(Key, KeyOrigin), KeyStoreError>;

    /// Returns the deployment key, creating it on first use.
    ///
    /// # Errors
    ///
    /// Same as [`KeyStore::ensure_key_with_origin`].
    fn ensure_key(&self) -> Result<Key, KeyStoreError> {
        self.ensure_key_with_origin().map(|(key, _)| key)
    }
}
