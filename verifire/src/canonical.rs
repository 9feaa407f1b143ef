//! Canonical serialization of values before they are sealed.
//!
//! Values are written as compact JSON encoded in UTF-8 with object keys in
//! sorted order at every level, so the same value always produces the same
//! bytes whether it came from a struct, a `BTreeMap` or a `HashMap`.
//! Optional fields are written as an explicit `null` rather than omitted,
//! which keeps the shape of a record stable across a round trip.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Error;

/// Encodes `value` into its canonical byte form.
///
/// # Errors
///
/// Returns `Error::MalformedPayload` if the value cannot be represented,
/// e.g. a map whose keys are not strings.
///
/// # Example
///
/// ```
/// use verifire::canonical::{decode, encode};
///
/// let bytes = encode(&"A1234567".to_string()).unwrap();
/// assert_eq!(bytes, b"\"A1234567\"");
/// let back: String = decode(&bytes).unwrap();
/// assert_eq!(back, "A1234567");
/// ```
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Error> {
    // `serde_json::Map` is backed by a `BTreeMap`, which sorts the keys
    let tree = serde_json::to_value(value)
        .map_err(|e| Error::MalformedPayload(format!("value is not serializable: {e}")))?;
    serde_json::to_vec(&tree)
        .map_err(|e| Error::MalformedPayload(format!("value is not serializable: {e}")))
}

/// Decodes canonical bytes back into a value.
///
/// # Errors
///
/// Returns `Error::MalformedPayload` if the bytes are not UTF-8 or are not
/// well-formed canonical output for `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::MalformedPayload(format!("payload is not UTF-8: {e}")))?;
    serde_json::from_str(text)
        .map_err(|e| Error::MalformedPayload(format!("payload is not canonical: {e}")))
}
