//! User records and the document handed to the external store.
//!
//! [`PlainRecord`] is the in-memory profile. [`RecordAssembler`] turns it
//! into a [`StoredRecord`] in which the sensitive part is a [`Token`], and
//! reverses that on retrieval.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::identity::{Identifier, IdentifierRegistry, IdentityGenerator};
use crate::token::Token;
use crate::vault::Vault;

/// How many identifiers to draw before giving up on a registry.
pub const DEFAULT_ID_ATTEMPTS: usize = 8;

/// Name parts of a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FullName {
    /// First name
    #[serde(rename = "First")]
    pub first: String,
    /// Middle name, written as `null` when absent
    #[serde(rename = "Middle")]
    pub middle: Option<String>,
    /// Last name
    #[serde(rename = "Last")]
    pub last: String,
}

/// One individual's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlainRecord {
    /// Email address
    #[serde(rename = "Email ID")]
    pub email: String,
    /// Name parts
    #[serde(rename = "Name")]
    pub name: FullName,
    /// Age in years
    #[serde(rename = "Age")]
    pub age: u32,
    /// Government ID number (sensitive)
    #[serde(rename = "ID Number")]
    pub id_number: String,
}

/// Which part of a record gets sealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SealMode {
    /// Only the ID number is sealed; the rest stays readable.
    #[default]
    IdNumber,
    /// The whole canonical record is sealed into one token.
    WholeRecord,
}

/// Document handed to the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredRecord {
    /// Readable profile with a sealed ID number.
    Profile {
        /// Generated identifier
        #[serde(rename = "User ID")]
        user_id: Identifier,
        /// Email address
        #[serde(rename = "Email ID")]
        email: String,
        /// Name parts
        #[serde(rename = "Name")]
        name: FullName,
        /// Age in years
        #[serde(rename = "Age")]
        age: u32,
        /// Sealed ID number
        #[serde(rename = "ID Number")]
        id_number: Token,
    },
    /// Entire record sealed into one token.
    Sealed {
        /// Generated identifier
        #[serde(rename = "User ID")]
        user_id: Identifier,
        /// Sealed canonical record
        #[serde(rename = "Record")]
        record: Token,
    },
}

impl StoredRecord {
    /// Returns the identifier the record was stored under.
    #[must_use]
    pub const fn user_id(&self) -> &Identifier {
        match self {
            Self::Profile { user_id, .. } | Self::Sealed { user_id, .. } => user_id,
        }
    }

    /// Returns the sealed token carried by this record.
    #[must_use]
    pub const fn token(&self) -> &Token {
        match self {
            Self::Profile { id_number, .. } => id_number,
            Self::Sealed { record, .. } => record,
        }
    }

    /// Returns the field-name → value mapping for the external store.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` if the record cannot be represented
    /// as a JSON object.
    pub fn to_document(&self) -> Result<serde_json::Map<String, serde_json::Value>, Error> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => Ok(map),
            Ok(other) => Err(Error::MalformedPayload(format!("expected an object, got {other}"))),
            Err(e) => Err(Error::MalformedPayload(format!("record is not serializable: {e}"))),
        }
    }

    /// Parses a mapping returned by the external store.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedPayload` if the mapping matches neither
    /// stored shape.
    pub fn from_document(
        document: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, Error> {
        serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|e| Error::MalformedPayload(format!("unrecognized stored record: {e}")))
    }
}

/// Builds stored records from plain ones and back.
///
/// # Example
///
/// ```
/// use verifire::key::Key;
/// use verifire::record::{FullName, PlainRecord, RecordAssembler, SealMode};
/// use verifire::vault::Vault;
///
/// # fn main() -> Result<(), verifire::error::Error> {
/// let key = Key::generate();
/// let assembler = RecordAssembler::new(Vault::new(&key));
///
/// let record = PlainRecord {
///     email: "saumy@example.com".to_string(),
///     name: FullName { first: "Saumy".into(), middle: None, last: "Kakkad".into() },
///     age: 21,
///     id_number: "A1234567".to_string(),
/// };
///
/// let stored = assembler.assemble(&record, SealMode::IdNumber)?;
/// assert_eq!(assembler.open(&stored)?, record);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RecordAssembler<'k> {
    vault: Vault<'k>,
    ids: IdentityGenerator,
}

impl<'k> RecordAssembler<'k> {
    /// Creates an assembler with the default identity generator.
    #[must_use]
    pub const fn new(vault: Vault<'k>) -> Self {
        Self { vault, ids: IdentityGenerator::new() }
    }

    /// Replaces the identity generator.
    #[must_use]
    pub const fn with_identity_generator(mut self, ids: IdentityGenerator) -> Self {
        self.ids = ids;
        self
    }

    /// Seals `record` under a freshly generated identifier.
    ///
    /// # Errors
    ///
    /// Returns any error from sealing the sensitive part.
    pub fn assemble(&self, record: &PlainRecord, mode: SealMode) -> Result<StoredRecord, Error> {
        let user_id = self.ids.generate(&record.name.first, &record.name.last);
        self.assemble_as(user_id, record, mode)
    }

    /// Like [`RecordAssembler::assemble`], but draws the identifier until
    /// `registry` reports it as free.
    ///
    /// # Errors
    ///
    /// Returns `Error::IdentifierExhausted` if no free identifier was found
    /// in [`DEFAULT_ID_ATTEMPTS`] draws, or any sealing error.
    pub fn assemble_unique<R>(
        &self,
        record: &PlainRecord,
        mode: SealMode,
        registry: &R,
    ) -> Result<StoredRecord, Error>
    where
        R: IdentifierRegistry + ?Sized,
    {
        let user_id = self.ids.generate_unique(
            &record.name.first,
            &record.name.last,
            registry,
            DEFAULT_ID_ATTEMPTS,
        )?;
        self.assemble_as(user_id, record, mode)
    }

    fn assemble_as(
        &self,
        user_id: Identifier,
        record: &PlainRecord,
        mode: SealMode,
    ) -> Result<StoredRecord, Error> {
        let stored = match mode {
            SealMode::IdNumber => StoredRecord::Profile {
                user_id,
                email: record.email.clone(),
                name: record.name.clone(),
                age: record.age,
                id_number: self.vault.encrypt_value(&record.id_number)?,
            },
            SealMode::WholeRecord => {
                StoredRecord::Sealed { user_id, record: self.vault.encrypt_value(record)? }
            }
        };
        tracing::debug!(user_id = %stored.user_id(), ?mode, "record assembled");
        Ok(stored)
    }

    /// Recovers the plain record from either stored shape.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthenticationFailed` (or another token rejection) if
    /// the token cannot be opened, `Error::MalformedPayload` if it opens to
    /// something that is not the expected value.
    pub fn open(&self, stored: &StoredRecord) -> Result<PlainRecord, Error> {
        match stored {
            StoredRecord::Profile { email, name, age, id_number, .. } => Ok(PlainRecord {
                email: email.clone(),
                name: name.clone(),
                age: *age,
                id_number: self.vault.decrypt_value(id_number)?,
            }),
            StoredRecord::Sealed { record, .. } => self.vault.decrypt_value(record),
        }
    }
}
