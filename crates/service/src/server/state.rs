//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use fieldseal::{FieldCrypt, SchemaRegistry};

/// Application state shared across all request handlers.
///
/// All fields are cheaply cloneable (`Arc`-wrapped or already `Arc`-backed) so
/// that Axum can clone the state for each request without copying expensive data.
#[derive(Clone)]
pub struct AppState {
    /// Field encryption engine holding the data key.
    pub engine: Arc<FieldCrypt>,
    /// Lock-free registry of record schemas.
    pub registry: SchemaRegistry,
    /// Name of the HTTP header used to identify the schema for each request.
    pub schema_header_name: Arc<String>,
}

impl AppState {
    /// Create a new [`AppState`] with the provided engine, registry and header name.
    pub fn new(engine: FieldCrypt, registry: SchemaRegistry, schema_header_name: String) -> Self {
        Self {
            engine: Arc::new(engine),
            registry,
            schema_header_name: Arc::new(schema_header_name),
        }
    }
}
