//! Configuration loading and validation for the service.
//!
//! All values are read from environment variables at startup. The process will
//! exit with a clear error message if any required variable is missing or invalid.

use std::time::Duration;

use anyhow::{Context, Result};
use fieldseal::{CipherSuite, DataKey, EngineOptions};
use serde::{Deserialize, Deserializer};

/// Validated service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Base64 (standard alphabet) data key, 16, 24 or 32 bytes. **Required.**
    #[serde(deserialize_with = "deserialize_data_key")]
    pub data_key: DataKey,

    /// Directory holding `*.yaml`, `*.yml` and `*.json` schema files. **Required.**
    pub schemas_dir: String,

    /// AEAD used to seal fields.
    #[serde(default)]
    pub cipher_suite: CipherSuite,

    /// Comma-separated name tags, highest priority first.
    #[serde(default = "default_name_tags")]
    pub name_tags: String,

    /// Tag holding the encryption-policy marker.
    #[serde(default = "default_policy_tag")]
    pub policy_tag: String,

    /// HTTP header used to identify which schema to apply.
    #[serde(default = "default_schema_header")]
    pub schema_header_name: String,

    /// How often (seconds) to reload schema files from `schemas_dir`.
    #[serde(default = "default_schema_refresh_interval")]
    pub schema_refresh_interval_secs: u64,

    /// Port the HTTP server listens on.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_name_tags() -> String {
    "bson,ename".into()
}
fn default_policy_tag() -> String {
    "encrypted".into()
}
fn default_schema_header() -> String {
    "X-Schema-Name".into()
}
fn default_schema_refresh_interval() -> u64 {
    300
}
fn default_listen_port() -> u16 {
    8080
}
fn default_log_level() -> String {
    "info".into()
}

fn deserialize_data_key<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DataKey, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    DataKey::from_base64(&encoded).map_err(serde::de::Error::custom)
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.schemas_dir, "SCHEMAS_DIR")?;
        ensure_non_empty(&self.schema_header_name, "SCHEMA_HEADER_NAME")?;

        if !self.cipher_suite.key_lengths().contains(&self.data_key.len()) {
            anyhow::bail!(
                "DATA_KEY is {} bytes, which {} does not accept",
                self.data_key.len(),
                self.cipher_suite
            );
        }
        if self.schema_refresh_interval_secs == 0 {
            anyhow::bail!("SCHEMA_REFRESH_INTERVAL_SECS must be > 0");
        }
        self.engine_options()
            .validate()
            .context("NAME_TAGS / POLICY_TAG are invalid")?;
        Ok(())
    }

    /// Engine options described by this configuration.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            name_tags: EngineOptions::parse_name_tags(&self.name_tags),
            policy_tag: self.policy_tag.trim().to_owned(),
            cipher_suite: self.cipher_suite,
        }
    }

    pub fn schema_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.schema_refresh_interval_secs)
    }
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
