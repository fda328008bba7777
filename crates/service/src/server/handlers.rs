//! Axum request handlers for all service endpoints.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use common::{
    protocol::{DecryptRequest, DecryptResponse, EncryptRequest, EncryptResponse, ErrorResponse, HealthResponse},
    ServiceError,
};
use fieldseal::{DynamicRecord, EncryptedRecord, ErrorKind, RecordSchema, SealError};
use tracing::{debug, warn};

use super::state::AppState;

/// `POST /encrypt`: seal the fields of a record payload.
///
/// The schema is identified by the value of the `X-Schema-Name` request header
/// (or the configured header name). The response payload is keyed by external
/// field name.
pub async fn encrypt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EncryptRequest>,
) -> Response {
    match encrypt_payload(&state, &headers, &req.payload) {
        Ok(payload) => (StatusCode::OK, Json(EncryptResponse { payload })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `POST /decrypt`: open an encrypted payload back into a record payload.
pub async fn decrypt(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<DecryptRequest>,
) -> Response {
    match decrypt_payload(&state, &headers, req.payload) {
        Ok(payload) => (StatusCode::OK, Json(DecryptResponse { payload })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when at least one schema is registered and
/// `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let schemas_loaded = state.registry.len();

    let (status_code, status_str) = if schemas_loaded > 0 {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        schemas_loaded,
        cipher_suite: state.engine.sealer().suite().to_string(),
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum Operation {
    Encrypt,
    Decrypt,
}

fn encrypt_payload(
    state: &AppState,
    headers: &HeaderMap,
    payload: &serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let schema = lookup_schema(state, headers)?;
    let record = DynamicRecord::from_json(Arc::clone(&schema), payload)
        .map_err(|e| service_error(e, Operation::Encrypt))?;
    let encrypted = state
        .engine
        .to_encrypted_record(&record)
        .map_err(|e| service_error(e, Operation::Encrypt))?;

    debug!(schema = %schema.name, fields = encrypted.len(), "payload encrypted");
    serde_json::to_value(&encrypted)
        .map_err(|e| ServiceError::Internal(format!("failed to serialise encrypted payload: {e}")))
}

fn decrypt_payload(
    state: &AppState,
    headers: &HeaderMap,
    payload: serde_json::Value,
) -> Result<serde_json::Value, ServiceError> {
    let schema = lookup_schema(state, headers)?;
    let encrypted: EncryptedRecord = serde_json::from_value(payload).map_err(|_| {
        ServiceError::BadRequest("payload must be a JSON object of string values".into())
    })?;
    let record = state
        .engine
        .from_encrypted_record(&encrypted, &DynamicRecord::zeroed(Arc::clone(&schema)))
        .map_err(|e| service_error(e, Operation::Decrypt))?;

    debug!(schema = %schema.name, fields = encrypted.len(), "payload decrypted");
    Ok(record.to_json())
}

/// Resolve the schema named by the configured request header.
fn lookup_schema(state: &AppState, headers: &HeaderMap) -> Result<Arc<RecordSchema>, ServiceError> {
    let header = state.schema_header_name.as_str();
    let name = headers
        .get(header)
        .ok_or_else(|| ServiceError::BadRequest(format!("missing {header} header")))?
        .to_str()
        .map_err(|_| {
            ServiceError::BadRequest(format!("{header} header contains non-ASCII characters"))
        })?;

    if state.registry.is_empty() {
        return Err(ServiceError::Unavailable("no schemas are loaded".into()));
    }
    state
        .registry
        .get(name)
        .map_err(|e| ServiceError::BadRequest(e.to_string()))
}

/// Map an engine error to the status the caller should see.
///
/// Errors caused by the request are echoed (they never contain field values);
/// anything else is logged and reported as a generic internal error.
fn service_error(err: SealError, op: Operation) -> ServiceError {
    match (err.kind(), op) {
        (
            ErrorKind::AuthenticationFailure
            | ErrorKind::MalformedInput
            | ErrorKind::ParseFailure
            | ErrorKind::SchemaMismatch,
            Operation::Decrypt,
        ) => {
            warn!(field = ?err.field_name(), kind = ?err.kind(), "decrypt rejected");
            ServiceError::Unprocessable(err.to_string())
        }
        (
            ErrorKind::ParseFailure | ErrorKind::SchemaMismatch | ErrorKind::UnsupportedType,
            Operation::Encrypt,
        )
        | (ErrorKind::UnknownSchema, _) => ServiceError::BadRequest(err.to_string()),
        _ => {
            warn!(error = %err, ?op, "request failed");
            ServiceError::Internal(match op {
                Operation::Encrypt => "encryption failed".into(),
                Operation::Decrypt => "decryption failed".into(),
            })
        }
    }
}

fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}
