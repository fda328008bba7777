//! Declarative record shapes and field descriptor resolution.
//!
//! # Responsibilities
//!
//! - Describe a record shape as an ordered list of [`FieldSpec`]s: source
//!   field name, declared [`TypeTag`], and [`FieldTags`].
//! - Resolve each field's external name and encryption policy
//!   ([`FieldResolver`]).
//! - Hold named shapes loaded from YAML/JSON in a [`SchemaRegistry`].
//!
//! # Module invariants
//!
//! - **No crypto dependencies.** This module must not import anything from
//!   `crate::crypto`.

pub mod registry;
pub mod resolver;
pub mod tags;

pub use registry::SchemaRegistry;
pub use resolver::{is_encrypted, resolve_name, FieldDescriptor, FieldResolver};
pub use tags::FieldTags;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::TypeTag;

/// Errors from field resolution and schema handling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// None of the prioritised name tags gave the field a non-empty name.
    #[error("field `{field}` has no usable name tag (looked for: {tried})")]
    MissingFieldName { field: String, tried: String },

    /// Two fields of one shape resolve to the same external name.
    #[error("external name `{0}` is used by more than one field")]
    DuplicateFieldName(String),

    /// Tag text could not be parsed.
    #[error("invalid tags `{tags}`: {reason}")]
    InvalidTags { tags: String, reason: String },

    /// No schema is registered under the requested name.
    #[error("unknown schema: {0}")]
    UnknownSchema(String),

    /// A schema document could not be parsed.
    #[error("invalid schema document: {0}")]
    InvalidSchema(String),
}

/// Declaration of one record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Source-side field name (the struct field identifier).
    pub name: String,
    /// Declared value type.
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Naming and policy annotations.
    #[serde(default)]
    pub tags: FieldTags,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, type_tag: TypeTag, tags: FieldTags) -> Self {
        Self {
            name: name.into(),
            type_tag,
            tags,
        }
    }
}

/// A named, ordered list of field declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    /// Parse a schema document, trying YAML first and falling back to JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidSchema`] if the text is neither, or if a
    /// type name or tag string inside it is invalid.
    pub fn from_document(text: &str) -> Result<Self, SchemaError> {
        match serde_yaml::from_str(text) {
            Ok(schema) => Ok(schema),
            Err(yaml_err) => serde_json::from_str(text)
                .map_err(|_| SchemaError::InvalidSchema(yaml_err.to_string())),
        }
    }

    /// Look up a field declaration by source name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }
}
