//! Value codec: typed field values to and from their canonical string form.
//!
//! The record orchestrator treats every field uniformly as "stringify,
//! optionally seal, later un-stringify". This module is the single place
//! that knows how each supported kind is written and read back.

pub mod json;
pub mod text;
pub mod value;

pub use text::{decode, encode, STRING_SEPARATOR};
pub use value::{FieldType, TypeTag, Uintptr, Value};

use thiserror::Error;

/// Errors produced by the value codec.
///
/// Messages name the type involved but never echo the input text, which may
/// be decrypted field content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The text is not a valid rendering of a value of `type_tag`.
    #[error("cannot parse {type_tag} value: {reason}")]
    ParseFailure { type_tag: TypeTag, reason: String },

    /// The type name is not one of the supported kinds.
    #[error("{0} is not a supported field type")]
    UnsupportedType(String),

    /// A value of one kind was assigned to a field of another.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: TypeTag, found: TypeTag },

    /// A record was asked for a field index it does not have.
    #[error("record has no field at index {0}")]
    NoSuchField(usize),
}
