//! Forwarding executor.
//!
//! One shared hyper client sends the rewritten request to the backend.
//! Transport failures surface as [`ProxyError::BackendUnreachable`]; they
//! are not retried, and no timeout is imposed beyond the transport's own
//! defaults (a documented limitation — callers wanting timeouts configure
//! them at the transport layer).

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::error::ProxyError;

/// Shared upstream client; connection reuse follows the pool defaults.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the process-wide upstream client. Cheap to clone.
pub fn build_client() -> HttpClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

/// Send one outbound request and return the response envelope with the
/// body still unread.
pub async fn forward(
    client: &HttpClient,
    request: Request<Body>,
) -> Result<Response<Incoming>, ProxyError> {
    client
        .request(request)
        .await
        .map_err(ProxyError::BackendUnreachable)
}
