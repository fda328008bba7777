//! Engine options: name-tag priority, policy tag, and cipher suite.

use serde::Deserialize;

use crate::crypto::CipherSuite;
use crate::error::SealError;
use crate::schema::resolver::{DEFAULT_NAME_TAGS, DEFAULT_POLICY_TAG};
use crate::schema::FieldResolver;

/// Options for a [`crate::FieldCrypt`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineOptions {
    /// Tags consulted for a field's external name, highest priority first.
    #[serde(default = "default_name_tags")]
    pub name_tags: Vec<String>,

    /// Tag holding the encryption-policy marker.
    #[serde(default = "default_policy_tag")]
    pub policy_tag: String,

    /// AEAD used to seal fields.
    #[serde(default)]
    pub cipher_suite: CipherSuite,
}

fn default_name_tags() -> Vec<String> {
    DEFAULT_NAME_TAGS.iter().map(|s| (*s).to_owned()).collect()
}
fn default_policy_tag() -> String {
    DEFAULT_POLICY_TAG.into()
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            name_tags: default_name_tags(),
            policy_tag: default_policy_tag(),
            cipher_suite: CipherSuite::default(),
        }
    }
}

impl EngineOptions {
    /// Parse a comma-separated name-tag list such as `"bson, ename"`.
    pub fn parse_name_tags(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Validate all options, returning a descriptive error on the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidConfig`] if there are no name tags, a name
    /// tag is blank or repeated, or the policy tag is blank or doubles as a
    /// name tag.
    pub fn validate(&self) -> Result<(), SealError> {
        if self.name_tags.is_empty() {
            return Err(SealError::InvalidConfig("at least one name tag is required".into()));
        }
        for (i, tag) in self.name_tags.iter().enumerate() {
            if tag.trim().is_empty() {
                return Err(SealError::InvalidConfig("name tags must not be empty".into()));
            }
            if self.name_tags[..i].contains(tag) {
                return Err(SealError::InvalidConfig(format!("name tag `{tag}` is listed twice")));
            }
        }
        if self.policy_tag.trim().is_empty() {
            return Err(SealError::InvalidConfig("policy tag must not be empty".into()));
        }
        if self.name_tags.contains(&self.policy_tag) {
            return Err(SealError::InvalidConfig(format!(
                "`{}` cannot be both a name tag and the policy tag",
                self.policy_tag
            )));
        }
        Ok(())
    }

    /// Build the field resolver these options describe.
    pub fn resolver(&self) -> FieldResolver {
        FieldResolver::new(self.name_tags.clone(), self.policy_tag.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let opts = EngineOptions::default();
        assert_eq!(opts.name_tags, vec!["bson".to_owned(), "ename".to_owned()]);
        assert_eq!(opts.policy_tag, "encrypted");
        assert_eq!(opts.cipher_suite, CipherSuite::AesGcm);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn deserialize_fills_defaults() {
        let opts: EngineOptions = serde_json::from_str(r#"{"cipher_suite":"aes-gcm-siv"}"#).unwrap();
        assert_eq!(opts.cipher_suite, CipherSuite::AesGcmSiv);
        assert_eq!(opts.policy_tag, "encrypted");
    }

    #[test]
    fn parse_name_tags_trims_and_drops_blanks() {
        assert_eq!(
            EngineOptions::parse_name_tags(" bson , ,ename"),
            vec!["bson".to_owned(), "ename".to_owned()]
        );
    }

    #[test]
    fn validate_rejects_bad_options() {
        let empty = EngineOptions {
            name_tags: vec![],
            ..Default::default()
        };
        assert!(empty.validate().is_err());

        let repeated = EngineOptions {
            name_tags: vec!["bson".into(), "bson".into()],
            ..Default::default()
        };
        assert!(repeated.validate().is_err());

        let clash = EngineOptions {
            policy_tag: "bson".into(),
            ..Default::default()
        };
        assert!(clash.validate().is_err());
    }
}
