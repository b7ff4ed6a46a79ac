//! Request-level error taxonomy.
//!
//! Only two synthetic responses ever leave the proxy: `502 Bad Gateway`
//! when the backend cannot be reached, and a generic `500` for anything
//! unexpected inside one request's handling. Every backend-originated
//! response, including 4xx/5xx, passes through untouched.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors recovered per request; none of these terminate the listener.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Transport-level failure reaching the backend (DNS, connect,
    /// timeout, TLS). Not retried.
    #[error("failed to forward the request: {0}")]
    BackendUnreachable(#[source] hyper_util::client::legacy::Error),

    /// Unexpected fault during handling. Details stay server-side.
    #[error("internal server error")]
    Internal(String),
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            ProxyError::BackendUnreachable(ref source) => {
                tracing::error!(error = %source, "failed to forward the request");
                // The cause is transport-level (addresses, IO errors) and
                // never contains the auth header value.
                (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
            }
            ProxyError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal fault while handling request");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
