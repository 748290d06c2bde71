// Response envelope module
// Uniform JSON wrapper applied to every API response: `meta` is reserved for
// response metadata and stays null until something needs it, `data` carries
// the resource payload or command acknowledgment.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::error;

const CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// The `{meta, data}` wrapper. Both keys are always present; `meta`
/// serializes as `null` when unset.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub meta: Option<Value>,
    pub data: Value,
}

/// Build an enveloped JSON response.
///
/// Encoding is fully buffered before any byte is handed to the transport; an
/// encoding failure turns into a 500 error body instead of a truncated
/// response.
pub fn json_response(status: StatusCode, meta: Option<Value>, data: Value) -> Response<Full<Bytes>> {
    let envelope = Envelope { meta, data };
    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(e) => {
            error!("failed to encode response envelope: {e}");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "serialization",
                "response could not be encoded",
            );
        }
    };

    Response::builder()
        .status(status)
        .header("Content-Type", CONTENT_TYPE)
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            error!("failed to build envelope response: {e}");
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build a machine-readable JSON error body with a stable `code` field.
pub fn error_response(status: StatusCode, code: &str, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "code": code,
        "message": message,
    });
    Response::builder()
        .status(status)
        .header("Content-Type", CONTENT_TYPE)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|e| {
            error!("failed to build error response: {e}");
            Response::new(Full::new(Bytes::new()))
        })
}
