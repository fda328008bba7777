//! Tag-driven field-level AEAD encryption for flat records.
//!
//! A record's fields are walked in declaration order. Each field's external
//! name comes from its tags (`bson`, then `ename` by default) and each field
//! is sealed unless its `encrypted` tag is exactly `"false"`. Values travel
//! through a canonical string form, so any supported scalar or
//! one-dimensional collection can be sealed and restored.
//!
//! ```
//! use fieldseal::{sealed_record, FieldCrypt};
//!
//! sealed_record! {
//!     #[derive(Debug, Default, PartialEq)]
//!     struct Person {
//!         name: String => [bson = "Name", encrypted = "false"],
//!         score: f64 => [bson = "Score"],
//!     }
//! }
//!
//! let engine = FieldCrypt::new(&[7u8; 32])?;
//! let person = Person { name: "abc".into(), score: 64.64 };
//! let encrypted = engine.to_encrypted_record(&person)?;
//! let back = engine.from_encrypted_record(&encrypted, &Person::default())?;
//! assert_eq!(back, person);
//! # Ok::<(), fieldseal::SealError>(())
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod record;
pub mod schema;

pub use codec::{CodecError, FieldType, TypeTag, Uintptr, Value};
pub use config::EngineOptions;
pub use crypto::{CipherEngine, CipherError, CipherSuite, DataKey, Sealer};
pub use engine::FieldCrypt;
pub use error::{ErrorKind, SealError};
pub use record::{DynamicRecord, EncryptedRecord, FieldValue, Record};
pub use schema::{FieldResolver, FieldSpec, FieldTags, RecordSchema, SchemaError, SchemaRegistry};
