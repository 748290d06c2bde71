//! HTTP response building module
//!
//! Builders for transport-native responses, decoupled from the JSON envelope
//! used by the API layer. Static and fallback paths answer with these, never
//! with JSON error bodies.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tracing::error;

/// Build a native 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(404)
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from("404 Not Found")))
        })
}

/// Log response build error
pub(crate) fn log_build_error(status: &str, error: &hyper::http::Error) {
    error!("failed to build {status} response: {error}");
}
