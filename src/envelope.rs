//! Wire envelope types for the JSON request/response protocol.
//!
//! Every dispatch exchanges exactly one [`Request`] for one [`Response`]:
//!
//! ```json
//! { "id": 1, "service": "Calculator", "method": "Add", "data": {"a": 2, "b": 3} }
//! { "id": 1, "data": {"result": 5}, "error": null }
//! ```
//!
//! All four request fields are required; a missing field fails envelope
//! decoding. The `data` payload stays raw until the target method is
//! resolved, because only the method's adapter knows its concrete type.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// Status codes emitted by the dispatcher.
pub mod status {
    /// The method was invoked and returned a result.
    pub const OK: u16 = 200;
    /// Malformed envelope, unknown service/method, or a handler error.
    pub const BAD_REQUEST: u16 = 400;
    /// Payload decode, middleware, or encode failure.
    pub const INTERNAL_SERVER_ERROR: u16 = 500;
}

/// Standard label for a status code, empty for unknown codes.
pub fn status_text(code: u16) -> &'static str {
    match code {
        status::OK => "OK",
        status::BAD_REQUEST => "Bad Request",
        status::INTERNAL_SERVER_ERROR => "Internal Server Error",
        _ => "",
    }
}

/// One inbound request envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    /// Caller-chosen correlation id, echoed in the response.
    pub id: i64,
    /// Target service name.
    pub service: String,
    /// Target method name within the service.
    pub method: String,
    /// Untyped payload, decoded by the resolved method's adapter.
    pub data: Box<RawValue>,
}

/// One outbound response envelope.
///
/// Exactly one of `data`/`error` is meaningfully populated; both fields
/// are always present on the wire (`null` when absent).
#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    /// Correlation id of the request, 0 when the envelope never decoded.
    pub id: i64,
    /// Result value on success.
    pub data: Option<Value>,
    /// Error details on failure.
    pub error: Option<ErrorInfo>,
}

impl Response {
    /// Build a success response carrying a result value.
    pub fn success(id: i64, data: Value) -> Self {
        Self {
            id,
            data: Some(data),
            error: None,
        }
    }

    /// Build a failure response carrying error details.
    pub fn failure(id: i64, error: ErrorInfo) -> Self {
        Self {
            id,
            data: None,
            error: Some(error),
        }
    }
}

/// Error details embedded in a failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// HTTP-style status code.
    pub code: u16,
    /// Standard label for `code`.
    pub message: String,
    /// Human-readable detail.
    pub info: String,
}

impl ErrorInfo {
    /// Build error details for a status code; `message` is filled from
    /// the standard status label.
    pub fn new(code: u16, info: impl Into<String>) -> Self {
        Self {
            code,
            message: status_text(code).to_string(),
            info: info.into(),
        }
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code={}, message={}", self.code, self.message)
    }
}

impl std::error::Error for ErrorInfo {}
