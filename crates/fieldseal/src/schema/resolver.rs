//! External-name and encryption-policy resolution for record fields.
//!
//! # Policy
//!
//! A field is encrypted unless its policy tag is exactly `"false"`. A missing
//! tag, an empty tag, `"False"`, `"no"` and every other value mean "encrypt".

use std::collections::HashSet;

use crate::codec::TypeTag;

use super::{FieldSpec, FieldTags, SchemaError};

/// Name tags consulted by default, highest priority first.
pub const DEFAULT_NAME_TAGS: [&str; 2] = ["bson", "ename"];

/// Tag holding the encryption-policy marker by default.
pub const DEFAULT_POLICY_TAG: &str = "encrypted";

/// The only policy value that opts a field out of encryption.
pub const OPT_OUT: &str = "false";

/// Resolved metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Key the field is stored under in an encrypted record.
    pub external_name: String,
    /// Whether the field value is sealed.
    pub encrypted: bool,
    /// Declared type of the field.
    pub type_tag: TypeTag,
}

/// Return the first non-empty value among `name_tags`, in order.
///
/// # Errors
///
/// Returns [`SchemaError::MissingFieldName`] if none of the tags yields a
/// non-empty value.
pub fn resolve_name<S: AsRef<str>>(spec: &FieldSpec, name_tags: &[S]) -> Result<String, SchemaError> {
    name_tags
        .iter()
        .filter_map(|key| spec.tags.get(key.as_ref()))
        .find(|name| !name.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| SchemaError::MissingFieldName {
            field: spec.name.clone(),
            tried: name_tags
                .iter()
                .map(|k| k.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Whether a field with `tags` is encrypted under `policy_tag`.
pub fn is_encrypted(tags: &FieldTags, policy_tag: &str) -> bool {
    tags.get(policy_tag) != Some(OPT_OUT)
}

/// Resolves [`FieldDescriptor`]s using a configured name priority and policy tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResolver {
    name_tags: Vec<String>,
    policy_tag: String,
}

impl FieldResolver {
    /// Create a resolver. `name_tags` is consulted in order.
    pub fn new(name_tags: Vec<String>, policy_tag: impl Into<String>) -> Self {
        Self {
            name_tags,
            policy_tag: policy_tag.into(),
        }
    }

    /// Name tags in priority order.
    pub fn name_tags(&self) -> &[String] {
        &self.name_tags
    }

    /// Tag holding the encryption-policy marker.
    pub fn policy_tag(&self) -> &str {
        &self.policy_tag
    }

    /// Whether `spec` is encrypted.
    pub fn is_encrypted(&self, spec: &FieldSpec) -> bool {
        is_encrypted(&spec.tags, &self.policy_tag)
    }

    /// Resolve one field.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingFieldName`] if no name tag is usable.
    pub fn describe(&self, spec: &FieldSpec) -> Result<FieldDescriptor, SchemaError> {
        Ok(FieldDescriptor {
            external_name: resolve_name(spec, &self.name_tags)?,
            encrypted: self.is_encrypted(spec),
            type_tag: spec.type_tag,
        })
    }

    /// Resolve every field of a record shape, in declaration order.
    ///
    /// Stops at the first field without a usable name.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::MissingFieldName`] for the first unnamed field and
    /// [`SchemaError::DuplicateFieldName`] if two fields resolve to the same
    /// external name.
    pub fn describe_all(&self, specs: &[FieldSpec]) -> Result<Vec<FieldDescriptor>, SchemaError> {
        let mut seen = HashSet::with_capacity(specs.len());
        specs
            .iter()
            .map(|spec| {
                let descriptor = self.describe(spec)?;
                if !seen.insert(descriptor.external_name.clone()) {
                    return Err(SchemaError::DuplicateFieldName(descriptor.external_name));
                }
                Ok(descriptor)
            })
            .collect()
    }
}

impl Default for FieldResolver {
    fn default() -> Self {
        Self::new(
            DEFAULT_NAME_TAGS.iter().map(|s| (*s).to_owned()).collect(),
            DEFAULT_POLICY_TAG,
        )
    }
}
