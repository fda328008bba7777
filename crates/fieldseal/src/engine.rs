//! Record orchestration: walks a record's fields and applies the resolver,
//! codec and cipher to each one.
//!
//! # Encrypt path
//!
//! 1. Resolve every field descriptor up front. A missing or duplicate
//!    external name aborts before any field is sealed.
//! 2. For each field in declaration order, encode the value to its canonical
//!    text and seal it if the field is encrypted.
//! 3. Store the result under the field's external name.
//!
//! # Decrypt path
//!
//! Fields are matched **by external name**. Each encrypted field is opened
//! and every field is decoded into its declared type and written into a
//! fresh instance from [`Record::blank`]. The first failure aborts the
//! whole operation; no partially filled record is ever returned.

use std::fmt;

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::codec::{self, CodecError};
use crate::config::EngineOptions;
use crate::crypto::{CipherEngine, CipherError, Sealer};
use crate::error::SealError;
use crate::record::{EncryptedRecord, FieldValue, Record};
use crate::schema::FieldResolver;

/// Field-level encryption engine.
///
/// Holds a [`Sealer`] and a [`FieldResolver`]; both are immutable, so one
/// instance can serve any number of threads.
pub struct FieldCrypt<S: Sealer = CipherEngine> {
    sealer: S,
    resolver: FieldResolver,
}

impl FieldCrypt<CipherEngine> {
    /// Build an AES-GCM engine with the default name tags and policy tag.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidKeyLength`](crate::ErrorKind::InvalidKeyLength)
    /// error unless `key` is 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, SealError> {
        Ok(Self::from_parts(CipherEngine::new(key)?, FieldResolver::default()))
    }

    /// Build an engine from explicit [`EngineOptions`].
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidConfig`] for unusable options and an
    /// [`InvalidKeyLength`](crate::ErrorKind::InvalidKeyLength) error if
    /// `key` does not suit the chosen cipher suite.
    pub fn with_options(key: &[u8], options: &EngineOptions) -> Result<Self, SealError> {
        options.validate()?;
        let sealer = CipherEngine::with_suite(key, options.cipher_suite)?;
        Ok(Self::from_parts(sealer, options.resolver()))
    }
}

impl<S: Sealer> FieldCrypt<S> {
    /// Assemble an engine from any [`Sealer`] and resolver.
    pub fn from_parts(sealer: S, resolver: FieldResolver) -> Self {
        Self { sealer, resolver }
    }

    /// The sealer used for every field.
    pub fn sealer(&self) -> &S {
        &self.sealer
    }

    /// The resolver that maps fields to external names and policy.
    pub fn resolver(&self) -> &FieldResolver {
        &self.resolver
    }

    // ------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------

    /// Encrypt `record` into a name-keyed map.
    ///
    /// # Errors
    ///
    /// Returns a `MissingFieldName` or `DuplicateFieldName` error before any
    /// sealing happens, and a field-scoped error if sealing a value fails.
    pub fn to_encrypted_record<R: Record>(&self, record: &R) -> Result<EncryptedRecord, SealError> {
        let specs = record.field_specs();
        let descriptors = self.resolver.describe_all(&specs).map_err(|e| {
            warn!(error = %e, "field resolution failed");
            SealError::from(e)
        })?;

        let mut out = EncryptedRecord::new();
        for (index, descriptor) in descriptors.iter().enumerate() {
            let value = record
                .field_value(index)
                .ok_or(CodecError::NoSuchField(index))
                .map_err(|e| SealError::field(&descriptor.external_name, e))?;
            let text = Zeroizing::new(codec::encode(&value));

            let stored = if descriptor.encrypted {
                let sealed = self
                    .sealer
                    .seal(text.as_bytes())
                    .map_err(|e| SealError::field(&descriptor.external_name, e))?;
                FieldValue::Sealed(sealed)
            } else {
                FieldValue::Plain(text.to_string())
            };
            out.insert(descriptor.external_name.clone(), stored);
        }

        debug!(
            fields = descriptors.len(),
            encrypted = descriptors.iter().filter(|d| d.encrypted).count(),
            "record encrypted"
        );
        Ok(out)
    }

    /// Encrypt `record` and serialise the map as JSON.
    ///
    /// Sealed values are written as standard base64 strings.
    ///
    /// # Errors
    ///
    /// As [`FieldCrypt::to_encrypted_record`], plus
    /// [`SealError::SerializationFailure`] if marshalling fails.
    pub fn to_encrypted_json<R: Record>(&self, record: &R) -> Result<Vec<u8>, SealError> {
        let encrypted = self.to_encrypted_record(record)?;
        Ok(serde_json::to_vec(&encrypted)?)
    }

    /// Rebuild a record of `template`'s shape from an encrypted map.
    ///
    /// `template` only supplies the shape; its values are never read.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::SchemaMismatch`] if the map and the shape disagree
    /// on field count, names or which fields are sealed, and a field-scoped
    /// error for the first field that fails to open or decode.
    pub fn from_encrypted_record<R: Record>(
        &self,
        encrypted: &EncryptedRecord,
        template: &R,
    ) -> Result<R, SealError> {
        let specs = template.field_specs();
        let descriptors = self.resolver.describe_all(&specs)?;

        if encrypted.len() != descriptors.len() {
            return Err(SealError::SchemaMismatch(format!(
                "encrypted record has {} fields, target declares {}",
                encrypted.len(),
                descriptors.len()
            )));
        }

        let mut out = template.blank();
        for (index, descriptor) in descriptors.iter().enumerate() {
            let name = &descriptor.external_name;
            let stored = encrypted.get(name).ok_or_else(|| {
                SealError::SchemaMismatch(format!("encrypted record has no field `{name}`"))
            })?;

            let decoded = if descriptor.encrypted {
                let sealed = stored.sealed_bytes().map_err(|e| SealError::field(name, e))?;
                let plain = Zeroizing::new(self.sealer.open(&sealed).map_err(|e| {
                    warn!(field = %name, error = %e, "field failed to open");
                    SealError::field(name, e)
                })?);
                let text = std::str::from_utf8(&plain).map_err(|_| {
                    SealError::field(
                        name,
                        CipherError::MalformedInput("decrypted value is not UTF-8".into()),
                    )
                })?;
                codec::decode(text, descriptor.type_tag)
            } else {
                match stored {
                    FieldValue::Plain(text) => codec::decode(text, descriptor.type_tag),
                    FieldValue::Sealed(_) => {
                        return Err(SealError::SchemaMismatch(format!(
                            "field `{name}` is sealed but declared as plaintext"
                        )))
                    }
                }
            };
            let value = decoded.map_err(|e| SealError::field(name, e))?;

            out.set_field_value(index, value)
                .map_err(|e| SealError::field(name, e))?;
        }

        debug!(fields = descriptors.len(), "record decrypted");
        Ok(out)
    }

    /// Rebuild a record from the JSON produced by [`FieldCrypt::to_encrypted_json`].
    ///
    /// # Errors
    ///
    /// As [`FieldCrypt::from_encrypted_record`], plus
    /// [`SealError::SerializationFailure`] if `json` is not a JSON object of
    /// strings, and a `MalformedInput` error if an encrypted field is not
    /// base64.
    pub fn from_encrypted_json<R: Record>(&self, json: &[u8], template: &R) -> Result<R, SealError> {
        let encrypted: EncryptedRecord = serde_json::from_slice(json)?;
        self.from_encrypted_record(&encrypted, template)
    }

    // ------------------------------------------------------------------
    // Leaf operations
    // ------------------------------------------------------------------

    /// Seal a UTF-8 string.
    pub fn encrypt_string(&self, plaintext: &str) -> Result<Vec<u8>, SealError> {
        self.encrypt_bytes(plaintext.as_bytes())
    }

    /// Open a sealed string.
    ///
    /// # Errors
    ///
    /// Returns `AuthenticationFailure` on tampering or a wrong key and
    /// `MalformedInput` if the input is truncated or the plaintext is not UTF-8.
    pub fn decrypt_string(&self, sealed: &[u8]) -> Result<String, SealError> {
        let plain = self.decrypt_bytes(sealed)?;
        String::from_utf8(plain).map_err(|_| {
            CipherError::MalformedInput("decrypted value is not UTF-8".into()).into()
        })
    }

    /// Seal raw bytes.
    pub fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>, SealError> {
        Ok(self.sealer.seal(plaintext)?)
    }

    /// Open sealed bytes.
    pub fn decrypt_bytes(&self, sealed: &[u8]) -> Result<Vec<u8>, SealError> {
        Ok(self.sealer.open(sealed)?)
    }
}

impl<S: Sealer> fmt::Debug for FieldCrypt<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCrypt")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::crypto::{CipherSuite, MockSealer};
    use crate::error::ErrorKind;

    const KEY: [u8; 32] = [
        176, 55, 108, 116, 181, 15, 21, 190, 134, 27, 183, 18, 48, 179, 221, 123, 225, 172, 55, 54,
        142, 158, 173, 59, 77, 239, 116, 99, 248, 15, 228, 254,
    ];

    crate::sealed_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Scored {
            name: String => [bson = "Name", encrypted = "false"],
            score: f64 => [bson = "Score"],
        }
    }

    crate::sealed_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct Unnamed {
            first: String => [bson = "First"],
            second: String => [encrypted = "true"],
        }
    }

    crate::sealed_record! {
        #[derive(Debug, Clone, Default, PartialEq)]
        struct TwoSecrets {
            a: String => [bson = "A"],
            b: String => [bson = "B"],
        }
    }

    fn scored() -> Scored {
        Scored {
            name: "abc".into(),
            score: 64.64,
        }
    }

    fn engine() -> FieldCrypt {
        FieldCrypt::new(&KEY).unwrap()
    }

    #[test]
    fn new_rejects_bad_key_sizes() {
        for len in [0usize, 8, 15, 17, 31, 33, 64] {
            let err = FieldCrypt::new(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidKeyLength, "len {len}");
        }
        for len in [16usize, 24, 32] {
            assert!(FieldCrypt::new(&vec![0u8; len]).is_ok(), "len {len}");
        }
    }

    #[test]
    fn with_options_validates_before_building() {
        let bad = EngineOptions {
            name_tags: vec![],
            ..Default::default()
        };
        assert_eq!(
            FieldCrypt::with_options(&KEY, &bad).unwrap_err().kind(),
            ErrorKind::InvalidConfig
        );

        let siv = EngineOptions {
            cipher_suite: CipherSuite::AesGcmSiv,
            ..Default::default()
        };
        assert_eq!(
            FieldCrypt::with_options(&[0u8; 24], &siv).unwrap_err().kind(),
            ErrorKind::InvalidKeyLength
        );
        let engine = FieldCrypt::with_options(&KEY, &siv).unwrap();
        assert_eq!(engine.sealer().suite(), CipherSuite::AesGcmSiv);
    }

    #[test]
    fn end_to_end_keeps_plain_fields_readable() {
        let engine = engine();
        let encrypted = engine.to_encrypted_record(&scored()).unwrap();

        assert_eq!(encrypted.len(), 2);
        assert_eq!(encrypted.get("Name"), Some(&FieldValue::Plain("abc".into())));
        match encrypted.get("Score") {
            Some(FieldValue::Sealed(bytes)) => assert!(bytes.len() > 12 + 16),
            other => panic!("Score should be sealed, got {other:?}"),
        }

        let back = engine.from_encrypted_record(&encrypted, &Scored::default()).unwrap();
        assert_eq!(back, scored());
    }

    #[test]
    fn json_round_trip() {
        let engine = engine();
        let json = engine.to_encrypted_json(&scored()).unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(parsed["Name"], "abc");
        assert!(parsed["Score"].is_string());

        let back = engine.from_encrypted_json(&json, &Scored::default()).unwrap();
        assert_eq!(back, scored());
    }

    #[test]
    fn missing_name_fails_before_any_seal() {
        let mut sealer = MockSealer::new();
        sealer.expect_seal().never();
        let engine = FieldCrypt::from_parts(sealer, FieldResolver::default());

        let err = engine
            .to_encrypted_record(&Unnamed {
                first: "x".into(),
                second: "y".into(),
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingFieldName);
    }

    #[test]
    fn every_field_gets_its_own_seal_call() {
        let mut sealer = MockSealer::new();
        sealer
            .expect_seal()
            .times(2)
            .returning(|plain| Ok(plain.to_vec()));
        let engine = FieldCrypt::from_parts(sealer, FieldResolver::default());

        let encrypted = engine
            .to_encrypted_record(&TwoSecrets {
                a: "1".into(),
                b: "2".into(),
            })
            .unwrap();
        assert_eq!(encrypted.get("A"), Some(&FieldValue::Sealed(b"1".to_vec())));
    }

    #[test]
    fn decrypt_stops_at_first_open_failure() {
        let mut sealer = MockSealer::new();
        sealer
            .expect_open()
            .times(1)
            .returning(|_| Err(CipherError::AuthenticationFailure));
        let engine = FieldCrypt::from_parts(sealer, FieldResolver::default());

        let encrypted: EncryptedRecord = [
            ("A".to_owned(), FieldValue::Sealed(vec![1; 40])),
            ("B".to_owned(), FieldValue::Sealed(vec![2; 40])),
        ]
        .into_iter()
        .collect();
        let err = engine
            .from_encrypted_record(&encrypted, &TwoSecrets::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.field_name(), Some("A"));
    }

    #[test]
    fn tampered_field_is_an_authentication_failure() {
        let engine = engine();
        let mut encrypted = engine.to_encrypted_record(&scored()).unwrap();
        if let Some(FieldValue::Sealed(bytes)) = encrypted.get_mut("Score") {
            let last = bytes.len() - 1;
            bytes[last] ^= 0x01;
        }
        let err = engine
            .from_encrypted_record(&encrypted, &Scored::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
        assert_eq!(err.field_name(), Some("Score"));
    }

    #[test]
    fn wrong_key_cannot_decrypt() {
        let encrypted = engine().to_encrypted_record(&scored()).unwrap();
        let other = FieldCrypt::new(&[7u8; 32]).unwrap();
        let err = other
            .from_encrypted_record(&encrypted, &Scored::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthenticationFailure);
    }

    #[test]
    fn shape_disagreements_are_schema_mismatches() {
        let engine = engine();
        let mut encrypted = engine.to_encrypted_record(&scored()).unwrap();

        let mut extra = encrypted.clone();
        extra.insert("Extra", FieldValue::Plain("1".into()));
        assert_eq!(
            engine.from_encrypted_record(&extra, &Scored::default()).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );

        let renamed: EncryptedRecord = encrypted
            .iter()
            .map(|(k, v)| (format!("{k}_x"), v.clone()))
            .collect();
        assert_eq!(
            engine.from_encrypted_record(&renamed, &Scored::default()).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );

        encrypted.insert("Name", FieldValue::Sealed(vec![0; 30]));
        assert_eq!(
            engine.from_encrypted_record(&encrypted, &Scored::default()).unwrap_err().kind(),
            ErrorKind::SchemaMismatch
        );
    }

    #[test]
    fn unparseable_plain_field_reports_its_name() {
        crate::sealed_record! {
            #[derive(Debug, Default)]
            struct PlainScore {
                name: String => [bson = "Name", encrypted = "false"],
                score: f64 => [bson = "Score", encrypted = "false"],
            }
        }

        // Score arrives as base64 text, which is not a float.
        let engine = engine();
        let json = engine.to_encrypted_json(&scored()).unwrap();
        let err = engine
            .from_encrypted_json(&json, &PlainScore::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        assert_eq!(err.field_name(), Some("Score"));
    }

    #[test]
    fn non_base64_sealed_json_is_malformed() {
        let engine = engine();
        let json = br#"{"Name":"abc","Score":"not base64!"}"#;
        let err = engine.from_encrypted_json(json, &Scored::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn invalid_json_is_a_serialization_failure() {
        let err = engine()
            .from_encrypted_json(b"[1,2", &Scored::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SerializationFailure);
    }

    #[test]
    fn string_leaf_round_trip() {
        let engine = engine();
        let first = engine.encrypt_string("test input").unwrap();
        let second = engine.encrypt_string("test input").unwrap();
        assert_ne!(first, second);
        assert_eq!(engine.decrypt_string(&first).unwrap(), "test input");
        assert_eq!(engine.decrypt_string(&second).unwrap(), "test input");
    }

    #[test]
    fn bytes_leaf_round_trip_and_short_input() {
        let engine = engine();
        let sealed = engine.encrypt_bytes(&[5, 4, 3, 2, 1]).unwrap();
        assert_eq!(engine.decrypt_bytes(&sealed).unwrap(), vec![5, 4, 3, 2, 1]);
        assert_eq!(
            engine.decrypt_bytes(&[0u8; 4]).unwrap_err().kind(),
            ErrorKind::MalformedInput
        );
    }

    #[test]
    fn non_utf8_plaintext_is_malformed() {
        let engine = engine();
        let sealed = engine.encrypt_bytes(&[0xFF, 0xFE]).unwrap();
        assert_eq!(
            engine.decrypt_string(&sealed).unwrap_err().kind(),
            ErrorKind::MalformedInput
        );
    }

    #[test]
    fn shared_engine_across_threads() {
        let engine = engine();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let engine = &engine;
                scope.spawn(move || {
                    let record = Scored {
                        name: format!("n{i}"),
                        score: f64::from(i) + 0.5,
                    };
                    let encrypted = engine.to_encrypted_record(&record).unwrap();
                    let back = engine
                        .from_encrypted_record(&encrypted, &Scored::default())
                        .unwrap();
                    assert_eq!(back, record);
                });
            }
        });
    }

    #[test]
    fn zero_value_fields_round_trip() {
        let engine = engine();
        let encrypted = engine.to_encrypted_record(&Scored::default()).unwrap();
        let back = engine
            .from_encrypted_record(&encrypted, &Scored::default())
            .unwrap();
        assert_eq!(back, Scored::default());
        assert_eq!(
            encrypted.get("Name"),
            Some(&FieldValue::Plain(codec::encode(&Value::String(String::new()))))
        );
    }

    #[test]
    fn debug_does_not_leak_key() {
        let rendered = format!("{:?}", engine());
        assert!(rendered.contains("FieldCrypt"));
        assert!(!rendered.contains("176"));
    }

    #[test]
    fn accessors_expose_configured_parts() {
        let options = EngineOptions {
            name_tags: vec!["json".into()],
            policy_tag: "secret".into(),
            cipher_suite: CipherSuite::AesGcmSiv,
        };
        let engine = FieldCrypt::with_options(&KEY, &options).unwrap();
        assert_eq!(engine.sealer().suite(), CipherSuite::AesGcmSiv);
        assert_eq!(engine.resolver().name_tags(), ["json".to_owned()]);
        assert_eq!(engine.resolver().policy_tag(), "secret");
    }
}
