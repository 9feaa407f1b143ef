//! File-based key store for `Verifire`.
//!
//! The deployment key lives in a single file as URL-safe base64 text. The
//! file is written once, on first use, and never touched again.

#![warn(clippy::pedantic, clippy::nursery)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use verifire::error::KeyStoreError;
use verifire::key::Key;
use verifire::key_store::{KeyOrigin, KeyStore};
use zeroize::Zeroizing;

/// Default key file name, relative to the working directory.
pub const DEFAULT_KEY_FILE: &str = "verifire_secret.key";

/// File-backed key store.
///
/// First-run creation is race-free across processes: the key is written to
/// a temporary file next to the target (mode 0600 on Unix) and linked into
/// place only if the target does not exist yet. A process that loses the
/// race reads the winner's key instead of overwriting it.
///
/// ```text
/// ./
/// └── verifire_secret.key   (44 bytes of base64, 0600 permissions)
/// ```
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    /// Creates a store backed by the file at `path`.
    ///
    /// Nothing is read or written until a key is requested.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the key file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads an existing key without ever creating one.
    ///
    /// # Errors
    ///
    /// Returns `KeyStoreError::Io` if the file cannot be read (including when
    /// it does not exist) and `KeyStoreError::KeyFormat` if its content is
    /// not a valid key.
    pub fn load(&self) -> Result<Key, KeyStoreError> {
        let text = Zeroizing::new(fs::read(&self.path)?);
        Key::from_encoded(&text)
    }

    fn persist_new(&self, key: &Key) -> io::Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(key.encode().as_bytes())?;
        file.as_file().sync_all()?;
        file.persist_noclobber(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

impl Default for FileKeyStore {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_FILE)
    }
}

impl KeyStore for FileKeyStore {
    fn ensure_key_with_origin(&self) -> Result<(Key, KeyOrigin), KeyStoreError> {
        match self.load() {
            Ok(key) => {
                debug!(path = %self.path.display(), fingerprint = %key.fingerprint(), "key loaded");
                return Ok((key, KeyOrigin::Loaded));
            }
            Err(KeyStoreError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }

        let key = Key::generate();
        match self.persist_new(&key) {
            Ok(()) => {
                info!(
                    path = %self.path.display(),
                    fingerprint = %key.fingerprint(),
                    "new key generated; keep this file safe and backed up"
                );
                Ok((key, KeyOrigin::Generated))
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                warn!(path = %self.path.display(), "key file appeared concurrently; using it");
                Ok((self.load()?, KeyOrigin::Loaded))
            }
            Err(e) => Err(KeyStoreError::CreationFailed(format!(
                "cannot write {}: {e}",
                self.path.display()
            ))),
        }
    }
}
