//! Request/response types for the host boundary
//!
//! Geometry buffers travel as base64 strings. Failures carry a numeric code
//! and, for core errors, the stable [`ErrorKind`] tag.

use crate::error::{ErrorKind, GeomError};
use anyhow::{ensure, Context};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// One call from the host
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    pub id: Option<serde_json::Value>,
    pub function: String,
    /// Named arguments, an object
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Reply to one [`Request`]; exactly one of `result` and `error` is set
#[derive(Debug, Serialize)]
pub struct Response {
    pub id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    pub message: String,
}

impl Response {
    /// Success; an explicit empty result is `Value::Null`
    pub fn success(id: Option<serde_json::Value>, result: serde_json::Value) -> Self {
        Response {
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<serde_json::Value>, code: i32, message: String) -> Self {
        Response {
            id,
            result: None,
            error: Some(ErrorResponse {
                code,
                kind: None,
                message,
            }),
        }
    }

    /// Error response for a failed core operation
    pub fn geom_error(id: Option<serde_json::Value>, err: &GeomError) -> Self {
        Response {
            id,
            result: None,
            error: Some(ErrorResponse {
                code: error_codes::for_kind(err.kind()),
                kind: Some(err.kind()),
                message: err.to_string(),
            }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Error codes
pub mod error_codes {
    use crate::error::ErrorKind;

    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const FUNCTION_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    // Core error kinds
    pub const MALFORMED_GEOMETRY: i32 = 1;
    pub const INCOMPATIBLE_REFERENCE_SYSTEMS: i32 = 2;
    pub const UNSUPPORTED_INPUT: i32 = 3;

    pub fn for_kind(kind: ErrorKind) -> i32 {
        match kind {
            ErrorKind::MalformedGeometry => MALFORMED_GEOMETRY,
            ErrorKind::IncompatibleReferenceSystems => INCOMPATIBLE_REFERENCE_SYSTEMS,
            ErrorKind::UnsupportedInput => UNSUPPORTED_INPUT,
        }
    }
}

pub fn encode_buffer(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}

/// Decode a base64 geometry buffer, refusing anything over `limit` bytes
pub fn decode_buffer(text: &str, limit: usize) -> anyhow::Result<Vec<u8>> {
    // base64 expands 3 bytes into 4 characters
    ensure!(
        text.len() / 4 * 3 <= limit.saturating_add(3),
        "buffer exceeds {} bytes",
        limit
    );
    let bytes = general_purpose::STANDARD
        .decode(text.trim())
        .context("buffer is not valid base64")?;
    ensure!(bytes.len() <= limit, "buffer of {} bytes exceeds {} bytes", bytes.len(), limit);
    Ok(bytes)
}
