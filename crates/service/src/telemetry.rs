//! Tracing subscriber setup: structured JSON logs to stdout.
//!
//! # Telemetry invariants
//!
//! - **No field values or key material** may appear in any span attribute or
//!   log field. Field names, counts and schema names are fine.
//! - `RUST_LOG` takes precedence over `LOG_LEVEL` when set.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter or if the
/// subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(log_level)?,
    };

    tracing_subscriber::fmt()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}

fn level_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level)
        .with_context(|| format!("LOG_LEVEL `{log_level}` is not a valid filter"))
}
