//! Namespaced user identifiers.
//!
//! An identifier is `PREFIX + RANDOM + SUFFIX` with no separators:
//!
//! - `PREFIX`: up to the first 3 characters of the uppercased first name
//! - `RANDOM`: a fixed number of characters drawn uniformly from
//!   [`ALPHABET`] using the OS CSPRNG
//! - `SUFFIX`: up to the last 3 characters of the uppercased last name
//!
//! Names are uppercased before they are cut, so a letter that expands
//! (`ß` becomes `SS`) never stretches a part past 3 characters.
//!
//! Nothing here checks previously issued identifiers. Collisions are made
//! unlikely by the random segment alone; callers that need a hard guarantee
//! pass an [`IdentifierRegistry`] to [`IdentityGenerator::generate_unique`].

use rand::{rngs::OsRng, Rng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::Error;

/// Characters the random segment is drawn from.
pub const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*";

/// Default length of the random segment.
pub const DEFAULT_SEGMENT_LENGTH: usize = 10;

/// Characters taken from each name.
const NAME_PART_LENGTH: usize = 3;

/// A generated user identifier. Immutable once issued.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Returns the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Answers whether an identifier is already in use at the storage boundary.
pub trait IdentifierRegistry {
    /// Returns `true` if `id` has already been issued.
    fn is_taken(&self, id: &Identifier) -> bool;
}

impl IdentifierRegistry for HashSet<Identifier> {
    fn is_taken(&self, id: &Identifier) -> bool {
        self.contains(id)
    }
}

impl<F> IdentifierRegistry for F
where
    F: Fn(&Identifier) -> bool,
{
    fn is_taken(&self, id: &Identifier) -> bool {
        self(id)
    }
}

/// Generates identifiers from name fragments plus a random core.
///
/// # Example
///
/// ```
/// use verifire::identity::IdentityGenerator;
///
/// let id = IdentityGenerator::new().generate("Saumy", "Kakkad");
/// assert!(id.as_str().starts_with("SAU"));
/// assert!(id.as_str().ends_with("KAD"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityGenerator {
    segment_length: usize,
}

impl IdentityGenerator {
    /// Creates a generator with the default segment length.
    #[must_use]
    pub const fn new() -> Self {
        Self { segment_length: DEFAULT_SEGMENT_LENGTH }
    }

    /// Sets the length of the random segment.
    #[must_use]
    pub const fn with_segment_length(mut self, segment_length: usize) -> Self {
        self.segment_length = segment_length;
        self
    }

    /// Returns the length of the random segment.
    #[must_use]
    pub const fn segment_length(&self) -> usize {
        self.segment_length
    }

    /// Generates one identifier. No uniqueness check is performed.
    #[must_use]
    pub fn generate(&self, first_name: &str, last_name: &str) -> Identifier {
        let mut id = name_prefix(first_name);
        id.push_str(&self.random_segment());
        id.push_str(&name_suffix(last_name));
        Identifier(id)
    }

    /// Generates identifiers until `registry` reports one as free.
    ///
    /// # Errors
    ///
    /// Returns `Error::IdentifierExhausted` if all `attempts` draws were
    /// already taken.
    pub fn generate_unique<R>(
        &self,
        first_name: &str,
        last_name: &str,
        registry: &R,
        attempts: usize,
    ) -> Result<Identifier, Error>
    where
        R: IdentifierRegistry + ?Sized,
    {
        for attempt in 1..=attempts {
            let id = self.generate(first_name, last_name);
            if !registry.is_taken(&id) {
                return Ok(id);
            }
            tracing::debug!(attempt, "generated identifier already taken");
        }
        Err(Error::IdentifierExhausted { attempts })
    }

    fn random_segment(&self) -> String {
        let mut rng = OsRng;
        (0..self.segment_length)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect()
    }
}

impl Default for IdentityGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn name_prefix(first_name: &str) -> String {
    first_name.trim().chars().flat_map(char::to_uppercase).take(NAME_PART_LENGTH).collect()
}

fn name_suffix(last_name: &str) -> String {
    let chars: Vec<char> = last_name.trim().chars().flat_map(char::to_uppercase).collect();
    let start = chars.len().saturating_sub(NAME_PART_LENGTH);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn middle(id: &Identifier, prefix: &str, suffix: &str) -> String {
        let text = id.as_str();
        text[prefix.len()..text.len() - suffix.len()].to_string()
    }

    #[test]
    fn test_identifier_shape() {
        let generator = IdentityGenerator::new();
        let id = generator.generate("Saumy", "Kakkad");

        assert!(id.as_str().starts_with("SAU"));
        assert!(id.as_str().ends_with("KAD"));
        assert_eq!(id.as_str().len(), 3 + DEFAULT_SEGMENT_LENGTH + 3);

        let segment = middle(&id, "SAU", "KAD");
        assert_eq!(segment.len(), DEFAULT_SEGMENT_LENGTH);
        assert!(segment.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn test_short_first_name_is_not_padded() {
        let generator = IdentityGenerator::new();
        let id = generator.generate("Al", "Kakkad");

        assert!(id.as_str().starts_with("AL"));
        assert!(id.as_str().ends_with("KAD"));
        assert_eq!(id.as_str().len(), 2 + DEFAULT_SEGMENT_LENGTH + 3);
    }

    #[test]
    fn test_short_last_name_is_not_padded() {
        let id = IdentityGenerator::new().with_segment_length(4).generate("Saumy", "Li");

        assert!(id.as_str().ends_with("LI"));
        assert_eq!(id.as_str().len(), 3 + 4 + 2);
    }

    #[test]
    fn test_configured_segment_length() {
        let generator = IdentityGenerator::new().with_segment_length(24);
        let id = generator.generate("Saumy", "Kakkad");

        assert_eq!(generator.segment_length(), 24);
        assert_eq!(middle(&id, "SAU", "KAD").len(), 24);
    }

    #[test]
    fn test_prefix_and_suffix_uppercased() {
        assert_eq!(name_prefix("saumy"), "SAU");
        assert_eq!(name_suffix("kakkad"), "KAD");
        assert_eq!(name_prefix("  al "), "AL");
        assert_eq!(name_suffix(""), "");
    }

    #[test]
    fn test_multibyte_names() {
        assert_eq!(name_prefix("Ülkü"), "ÜLK");
        assert_eq!(name_suffix("Gölçük"), "ÇÜK");
    }

    #[test]
    fn test_expanding_uppercase_stays_three_chars() {
        assert_eq!(name_prefix("ßab"), "SSA");
        assert_eq!(name_suffix("Strauß"), "USS");

        let id = IdentityGenerator::new().with_segment_length(0).generate("ßab", "Strauß");
        assert_eq!(id.as_str(), "SSAUSS");
        assert_eq!(id.as_str().chars().count(), 6);
    }

    #[test]
    fn test_identifiers_differ() {
        let generator = IdentityGenerator::new();
        let ids: HashSet<Identifier> =
            (0..100).map(|_| generator.generate("Saumy", "Kakkad")).collect();

        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_segment_covers_alphabet_classes() {
        let generator = IdentityGenerator::new().with_segment_length(2000);
        let id = generator.generate("", "");
        let text = id.as_str();

        assert!(text.chars().any(|c| c.is_ascii_uppercase()));
        assert!(text.chars().any(|c| c.is_ascii_lowercase()));
        assert!(text.chars().any(|c| c.is_ascii_digit()));
        assert!(text.chars().any(|c| "!@#$%^&*".contains(c)));
    }

    #[test]
    fn test_generate_unique_skips_taken() {
        let generator = IdentityGenerator::new().with_segment_length(1);
        let calls = std::cell::Cell::new(0);
        let registry = |_: &Identifier| {
            calls.set(calls.get() + 1);
            calls.get() < 3
        };

        let id = generator.generate_unique("Saumy", "Kakkad", &registry, 5).unwrap();
        assert_eq!(calls.get(), 3);
        assert!(id.as_str().starts_with("SAU"));
    }

    #[test]
    fn test_generate_unique_exhausted() {
        let generator = IdentityGenerator::new();
        let registry = |_: &Identifier| true;

        let result = generator.generate_unique("Saumy", "Kakkad", &registry, 4);
        assert!(matches!(result, Err(Error::IdentifierExhausted { attempts: 4 })));
    }

    #[test]
    fn test_generate_unique_with_set() {
        let generator = IdentityGenerator::new();
        let mut issued: HashSet<Identifier> = HashSet::new();

        for _ in 0..10 {
            let id = generator.generate_unique("Saumy", "Kakkad", &issued, 3).unwrap();
            assert!(issued.insert(id));
        }
    }
}
