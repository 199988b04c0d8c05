//! Error types for the gateway's HTTP layer.
//!
//! [`ObserverError`] unifies the failures a request can hit into a single
//! enum that converts into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. None of
//! them is fatal to the service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors that can occur while serving a request.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource does not exist (e.g. latest snapshot of an
    /// empty history).
    #[error("not found: {0}")]
    NotFound(String),

    /// A posted body could not be decoded as a snapshot.
    #[error("invalid snapshot payload: {0}")]
    InvalidPayload(String),

    /// An invalid query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A response body could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::InvalidPayload(msg) | Self::InvalidQuery(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
