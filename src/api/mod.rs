//! API handler layer
//!
//! The resource-handler contract: a handler is bound to one method and
//! pattern, receives the captured path parameters and the raw request body
//! stream, and produces either a [`Reply`] (wrapped in the response envelope)
//! or a typed [`Failure`]. Handlers never write to the transport directly, so
//! the envelope shape and status mapping stay centralized and testable.

pub mod envelope;
pub mod groups;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::id::IdError;
use crate::router::Params;

pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Request body stream as seen by handlers.
pub type Body = UnsyncBoxBody<Bytes, BodyError>;

/// Success outcome of a handler, prior to envelope serialization.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub meta: Option<Value>,
    pub data: Value,
}

impl Reply {
    /// Wrap `data` for the envelope with the default 200 status.
    pub fn with(data: impl Serialize) -> Result<Self, Failure> {
        let data =
            serde_json::to_value(data).map_err(|e| Failure::Serialization(e.to_string()))?;
        Ok(Self {
            status: StatusCode::OK,
            meta: None,
            data,
        })
    }
}

/// Failure outcome of a handler, mapped to a status and a stable error code.
#[derive(Debug, Error)]
pub enum Failure {
    #[error("identifier generation failed: {0}")]
    IdGeneration(String),
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("response serialization failed: {0}")]
    Serialization(String),
}

impl Failure {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Self::IdGeneration(_) | Self::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::IdGeneration(_) => "id_generation",
            Self::InvalidBody(_) => "invalid_body",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl From<IdError> for Failure {
    fn from(err: IdError) -> Self {
        Self::IdGeneration(err.reason)
    }
}

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, Failure>> + Send>>;

/// A resource handler bound into the route table. It receives the captured
/// path parameters and the raw request body stream.
pub type Handler = Arc<dyn Fn(Params, Body) -> HandlerFuture + Send + Sync>;

/// Run `handler` and translate its outcome into an HTTP response.
pub async fn run(handler: &Handler, params: Params, body: Body) -> Response<Full<Bytes>> {
    match handler(params, body).await {
        Ok(reply) => envelope::json_response(reply.status, reply.meta, reply.data),
        Err(failure) => {
            warn!("handler failure: {failure}");
            envelope::error_response(failure.status(), failure.code(), &failure.to_string())
        }
    }
}

#[cfg(test)]
pub(crate) fn test_body(bytes: &[u8]) -> Body {
    use http_body_util::BodyExt;

    Full::new(Bytes::copy_from_slice(bytes))
        .map_err(|never: std::convert::Infallible| -> BodyError { match never {} })
        .boxed_unsync()
}
