//! Request and response types for the `fieldseal-svc` HTTP API.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /encrypt`.
///
/// `payload` is a JSON object keyed by the source field names of the schema
/// named in the `X-Schema-Name` request header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptRequest {
    pub payload: serde_json::Value,
}

/// Successful response body for `POST /encrypt`.
///
/// `payload` is keyed by external field name. Encrypted fields hold base64
/// sealed values; the others hold their canonical text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Decrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /decrypt`: an [`EncryptResponse`] payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptRequest {
    pub payload: serde_json::Value,
}

/// Successful response body for `POST /decrypt`, keyed by source field name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecryptResponse {
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Number of record schemas currently registered.
    pub schemas_loaded: usize,
    /// Cipher suite fields are sealed with, e.g. `"aes-gcm"`.
    pub cipher_suite: String,
}
