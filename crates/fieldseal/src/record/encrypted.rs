//! [`EncryptedRecord`]: the name-keyed output of the encrypt path.
//!
//! # JSON form
//!
//! Sealed values are written as standard-alphabet base64 strings, the usual
//! byte-sequence convention of JSON document stores. Plain values are written
//! as-is. On the way back in every value arrives as [`FieldValue::Plain`];
//! the decrypt path knows from the target shape which ones to base64-decode.

use std::{borrow::Cow, collections::BTreeMap};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::crypto::CipherError;

/// A stored field: sealed bytes or plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// `nonce ∥ ciphertext ∥ tag`.
    Sealed(Vec<u8>),
    /// Canonical text of an unencrypted field.
    Plain(String),
}

impl FieldValue {
    /// Sealed bytes of an encrypted field.
    ///
    /// A [`FieldValue::Plain`] is read as the base64 text of the sealed bytes,
    /// which is how sealed values come back from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::MalformedInput`] if a plain value is not base64.
    pub fn sealed_bytes(&self) -> Result<Cow<'_, [u8]>, CipherError> {
        match self {
            FieldValue::Sealed(bytes) => Ok(Cow::Borrowed(bytes)),
            FieldValue::Plain(text) => STANDARD
                .decode(text)
                .map(Cow::Owned)
                .map_err(|e| CipherError::MalformedInput(format!("sealed value is not base64: {e}"))),
        }
    }

    /// `true` for [`FieldValue::Sealed`].
    pub fn is_sealed(&self) -> bool {
        matches!(self, FieldValue::Sealed(_))
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Sealed(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
            FieldValue::Plain(text) => serializer.serialize_str(text),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(FieldValue::Plain)
    }
}

/// Mapping from external field name to stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedRecord {
    fields: BTreeMap<String, FieldValue>,
}

impl EncryptedRecord {
    /// An empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `name`, returning any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.fields.insert(name.into(), value)
    }

    /// Value stored under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Mutable access, e.g. for storage layers that rewrite values in place.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut FieldValue> {
        self.fields.get_mut(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// `true` when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether a field named `name` is present.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }
}

impl FromIterator<(String, FieldValue)> for EncryptedRecord {
    fn from_iter<I: IntoIterator<Item = (String, FieldValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
