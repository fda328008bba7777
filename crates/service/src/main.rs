//! `fieldseal-svc`: HTTP front end for field-level record encryption.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured logging.
//! 3. Build the [`FieldCrypt`] engine from the data key and engine options.
//! 4. Load record schemas from the schemas directory into a [`SchemaRegistry`].
//! 5. Spawn the schema refresh task.
//! 6. Build the Axum router and start the HTTP server.

mod config;
mod schema;
mod server;
mod telemetry;

use std::path::PathBuf;

use anyhow::{Context, Result};
use fieldseal::{FieldCrypt, SchemaRegistry};
use tracing::info;

use config::Config;
use server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Logging is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        cipher_suite = %cfg.cipher_suite,
        "fieldseal-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Engine
    // -----------------------------------------------------------------------
    let options = cfg.engine_options();
    let engine = FieldCrypt::with_options(cfg.data_key.as_bytes(), &options)
        .context("failed to build field encryption engine")?;

    // -----------------------------------------------------------------------
    // 4. Schema registry
    // -----------------------------------------------------------------------
    let schemas_dir = PathBuf::from(&cfg.schemas_dir);
    let registry = SchemaRegistry::new();
    schema::load_all(&schemas_dir, engine.resolver(), &registry).await?;

    // -----------------------------------------------------------------------
    // 5. Background tasks
    // -----------------------------------------------------------------------
    let _schema_refresh = schema::refresh_task(
        schemas_dir,
        cfg.schema_refresh_interval(),
        engine.resolver().clone(),
        registry.clone(),
    );

    // -----------------------------------------------------------------------
    // 6. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(engine, registry, cfg.schema_header_name.clone());
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(listener, router).await?;

    Ok(())
}
