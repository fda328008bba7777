//! [`FieldTags`]: the declarative annotations attached to a record field.
//!
//! Tags are written like struct tags: space-separated `key:"value"` pairs,
//! e.g. `bson:"Name" encrypted:"false"`. Schema files may also give them as a
//! plain key/value map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::SchemaError;

/// Key/value annotations of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTags", into = "BTreeMap<String, String>")]
pub struct FieldTags(BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTags {
    Text(String),
    Map(BTreeMap<String, String>),
}

impl TryFrom<RawTags> for FieldTags {
    type Error = SchemaError;

    fn try_from(raw: RawTags) -> Result<Self, Self::Error> {
        match raw {
            RawTags::Text(text) => FieldTags::parse(&text),
            RawTags::Map(map) => Ok(FieldTags(map)),
        }
    }
}

impl From<FieldTags> for BTreeMap<String, String> {
    fn from(tags: FieldTags) -> Self {
        tags.0
    }
}

impl FieldTags {
    /// Build tags from `(key, value)` pairs. Later pairs win on duplicate keys.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        FieldTags(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        )
    }

    /// Parse struct-tag text such as `bson:"Name" encrypted:"false"`.
    ///
    /// Values are double-quoted and may contain `\"` and `\\` escapes. For
    /// duplicate keys the first occurrence wins.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidTags`] on a missing `:`, an unquoted
    /// value, or an unterminated quote.
    pub fn parse(text: &str) -> Result<Self, SchemaError> {
        let mut tags = BTreeMap::new();
        let mut rest = text.trim_start();

        while !rest.is_empty() {
            let colon = rest
                .find(':')
                .ok_or_else(|| invalid(text, "expected `key:\"value\"`"))?;
            let key = &rest[..colon];
            if key.is_empty() || key.contains(|c: char| c.is_whitespace() || c == '"') {
                return Err(invalid(text, "malformed tag key"));
            }

            let after = rest[colon + 1..]
                .strip_prefix('"')
                .ok_or_else(|| invalid(text, "tag value must be double-quoted"))?;

            let mut value = String::new();
            let mut chars = after.char_indices();
            let mut end = None;
            while let Some((i, c)) = chars.next() {
                match c {
                    '"' => {
                        end = Some(i);
                        break;
                    }
                    '\\' => match chars.next() {
                        Some((_, escaped)) => value.push(escaped),
                        None => break,
                    },
                    c => value.push(c),
                }
            }
            let end = end.ok_or_else(|| invalid(text, "unterminated tag value"))?;

            tags.entry(key.to_owned()).or_insert(value);
            rest = after[end + 1..].trim_start();
        }

        Ok(FieldTags(tags))
    }

    /// Look up a tag value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of tags present.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if the field carries no tags at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn invalid(text: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidTags {
        tags: text.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_struct_tag_text() {
        let tags = FieldTags::parse(r#"bson:"String" encrypted:"false""#).unwrap();
        assert_eq!(tags.get("bson"), Some("String"));
        assert_eq!(tags.get("encrypted"), Some("false"));
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn empty_text_is_no_tags() {
        assert!(FieldTags::parse("").unwrap().is_empty());
        assert!(FieldTags::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn values_may_contain_spaces_and_escapes() {
        let tags = FieldTags::parse(r#"ename:"full name"  note:"say \"hi\"""#).unwrap();
        assert_eq!(tags.get("ename"), Some("full name"));
        assert_eq!(tags.get("note"), Some(r#"say "hi""#));
    }

    #[test]
    fn empty_value_is_kept() {
        let tags = FieldTags::parse(r#"bson:"" ename:"Alt""#).unwrap();
        assert_eq!(tags.get("bson"), Some(""));
    }

    #[test]
    fn first_duplicate_wins() {
        let tags = FieldTags::parse(r#"bson:"a" bson:"b""#).unwrap();
        assert_eq!(tags.get("bson"), Some("a"));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in [
            "bson",
            r#"bson:Name"#,
            r#"bson:"Name"#,
            r#":"Name""#,
            r#"b son:"x""#,
        ] {
            assert!(
                matches!(FieldTags::parse(text), Err(SchemaError::InvalidTags { .. })),
                "{text:?} accepted"
            );
        }
    }

    #[test]
    fn deserializes_from_text_or_map() {
        let from_text: FieldTags = serde_json::from_str(r#""bson:\"Name\"""#).unwrap();
        let from_map: FieldTags = serde_json::from_str(r#"{"bson":"Name"}"#).unwrap();
        assert_eq!(from_text, from_map);
        assert!(serde_json::from_str::<FieldTags>(r#""bson:Name""#).is_err());
    }
}
