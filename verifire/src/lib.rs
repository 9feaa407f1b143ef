//! # `Verifire`
//!
//! Field-level encryption for user records kept in an external document
//! store.
//!
//! ## Features
//!
//! - Single deployment key, loaded or generated once by a [`KeyStore`]
//! - AEAD tokens (XChaCha20-Poly1305) with tamper and wrong-key detection
//! - Canonical JSON serialization of records before sealing
//! - Namespaced user identifiers with a CSPRNG core
//! - Record assembly: readable profile fields next to sealed ones
//!
//! ## Example
//!
//! ```rust,ignore
//! use verifire::prelude::*;
//! use verifire_key_file::FileKeyStore;
//!
//! let key = FileKeyStore::new("verifire_secret.key").ensure_key()?;
//! let vault = Vault::new(&key);
//!
//! let token = vault.encrypt_value("A1234567")?;
//! let id_number: String = vault.decrypt_value(&token)?;
//! ```
//!
//! [`KeyStore`]: key_store::KeyStore

#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod canonical;
pub mod error;
pub mod identity;
pub mod key;
pub mod key_store;
pub mod record;
pub mod token;
pub mod vault;

pub mod prelude {
    //! Convenience re-exports for common use.
    pub use crate::error::{Error, KeyStoreError};
    pub use crate::identity::{Identifier, IdentifierRegistry, IdentityGenerator};
    pub use crate::key::Key;
    pub use crate::key_store::{KeyOrigin, KeyStore};
    pub use crate::record::{FullName, PlainRecord, RecordAssembler, SealMode, StoredRecord};
    pub use crate::token::Token;
    pub use crate::vault::Vault;
}
