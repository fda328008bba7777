//! Crate-level error type.
//!
//! Module errors ([`CipherError`], [`CodecError`], [`SchemaError`]) roll up
//! into [`SealError`]. Failures tied to one field are wrapped in
//! [`SealError::Field`] so callers can tell which field failed. Messages
//! never carry field values or key material.

use thiserror::Error;

use crate::codec::CodecError;
use crate::crypto::CipherError;
use crate::schema::SchemaError;

/// Every failure the engine can report.
#[derive(Debug, Error)]
pub enum SealError {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// The encrypted input does not line up with the target record shape.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// The encrypted map could not be serialised to or parsed from JSON.
    #[error("serialization failed: {0}")]
    SerializationFailure(#[from] serde_json::Error),

    /// Engine options are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A failure scoped to one field, named by its external name.
    #[error("field `{field}`: {source}")]
    Field {
        field: String,
        #[source]
        source: Box<SealError>,
    },
}

/// Flat classification of a [`SealError`], independent of where it arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidKeyLength,
    MissingFieldName,
    DuplicateFieldName,
    AuthenticationFailure,
    MalformedInput,
    ParseFailure,
    UnsupportedType,
    SerializationFailure,
    SchemaMismatch,
    InvalidTags,
    UnknownSchema,
    InvalidConfig,
    RandomnessFailure,
    /// The AEAD primitive failed while sealing.
    CipherFailure,
}

impl SealError {
    /// Wrap `err` with the name of the field it concerns.
    pub fn field(name: impl Into<String>, err: impl Into<SealError>) -> Self {
        SealError::Field {
            field: name.into(),
            source: Box::new(err.into()),
        }
    }

    /// The outermost field name attached to this error, if any.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            SealError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// Classify the error, looking through field context.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SealError::Field { source, .. } => source.kind(),
            SealError::Cipher(e) => match e {
                CipherError::InvalidKeyLength { .. } => ErrorKind::InvalidKeyLength,
                CipherError::InvalidKeyEncoding(_) | CipherError::UnknownSuite(_) => {
                    ErrorKind::InvalidConfig
                }
                CipherError::AuthenticationFailure => ErrorKind::AuthenticationFailure,
                CipherError::MalformedInput(_) => ErrorKind::MalformedInput,
                CipherError::RandomnessFailure => ErrorKind::RandomnessFailure,
                CipherError::SealFailure => ErrorKind::CipherFailure,
            },
            SealError::Codec(e) => match e {
                CodecError::ParseFailure { .. } => ErrorKind::ParseFailure,
                CodecError::UnsupportedType(_) => ErrorKind::UnsupportedType,
                CodecError::TypeMismatch { .. } | CodecError::NoSuchField(_) => {
                    ErrorKind::SchemaMismatch
                }
            },
            SealError::Schema(e) => match e {
                SchemaError::MissingFieldName { .. } => ErrorKind::MissingFieldName,
                SchemaError::DuplicateFieldName(_) => ErrorKind::DuplicateFieldName,
                SchemaError::InvalidTags { .. } => ErrorKind::InvalidTags,
                SchemaError::UnknownSchema(_) => ErrorKind::UnknownSchema,
                SchemaError::InvalidSchema(_) => ErrorKind::InvalidConfig,
            },
            SealError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            SealError::SerializationFailure(_) => ErrorKind::SerializationFailure,
            SealError::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}
