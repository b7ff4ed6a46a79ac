//! Request rewriting.
//!
//! # Responsibilities
//! - Point the outbound request at the configured backend
//! - Overwrite the identity auth header with the configured secret
//! - Normalize the `api-version` query parameter when present
//!
//! # Design Decisions
//! - Rewriting is pure and total: everything that can fail (backend URL,
//!   header value) is validated once when the `Rewriter` is built
//! - The request body is moved, never buffered; arbitrarily large bodies
//!   stream straight through
//! - The query is re-serialized with standard form encoding only when the
//!   `api-version` parameter is actually replaced

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, HOST};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Uri};
use url::form_urlencoded;

use crate::config::ProxyConfig;

/// Header carrying the secret that authenticates the proxy to the backend.
pub const X_IDENTITY_HEADER: HeaderName = HeaderName::from_static("x-identity-header");

/// Query parameter normalized to the configured API version.
const API_VERSION_PARAM: &str = "api-version";

/// Precomputed rewrite target, built once from the resolved configuration.
#[derive(Debug, Clone)]
pub struct Rewriter {
    scheme: Scheme,
    authority: Authority,
    host_value: HeaderValue,
    auth_value: HeaderValue,
    api_version: String,
}

impl Rewriter {
    /// Build the rewriter from the resolved configuration.
    ///
    /// Fails only on a backend URL that cannot form a request target or an
    /// auth header value that is not a legal header value; both are
    /// startup-time conditions.
    pub fn new(config: &ProxyConfig) -> Result<Self, axum::http::Error> {
        let scheme = Scheme::try_from(config.backend.scheme())?;

        let host = config.backend.host_str().unwrap_or_default();
        let authority = match config.backend.port() {
            Some(port) => Authority::try_from(format!("{host}:{port}").as_str())?,
            None => Authority::try_from(host)?,
        };

        let host_value = HeaderValue::from_str(authority.as_str())?;
        // Sensitive values Debug-print as "Sensitive" instead of their
        // contents; the secret must never reach the logs.
        let mut auth_value = HeaderValue::from_str(&config.auth_header_value)?;
        auth_value.set_sensitive(true);

        Ok(Self {
            scheme,
            authority,
            host_value,
            auth_value,
            api_version: config.api_version.clone(),
        })
    }

    /// Transform one inbound request into the outbound request to send to
    /// the backend. No I/O; the body is passed through untouched.
    pub fn rewrite(&self, request: Request<Body>) -> Request<Body> {
        let (mut parts, body) = request.into_parts();

        let mut uri_parts = parts.uri.clone().into_parts();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        uri_parts.path_and_query = Some(match parts.uri.path_and_query() {
            Some(pq) => self.rewrite_path_and_query(pq),
            None => PathAndQuery::from_static("/"),
        });
        parts.uri = Uri::from_parts(uri_parts).unwrap_or_else(|_| parts.uri.clone());

        // The inbound host is discarded; the backend sees its own
        // authority as the Host header.
        parts.headers.insert(HOST, self.host_value.clone());
        parts
            .headers
            .insert(X_IDENTITY_HEADER, self.auth_value.clone());

        Request::from_parts(parts, body)
    }

    /// Replace the `api-version` value if and only if the parameter is
    /// already present; otherwise the path and query round-trip untouched.
    fn rewrite_path_and_query(&self, pq: &PathAndQuery) -> PathAndQuery {
        let query = match pq.query() {
            Some(q) => q,
            None => return pq.clone(),
        };

        let pairs: Vec<(String, String)> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        if !pairs.iter().any(|(key, _)| key == API_VERSION_PARAM) {
            return pq.clone();
        }

        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            if key == API_VERSION_PARAM {
                serializer.append_pair(key, &self.api_version);
            } else {
                serializer.append_pair(key, value);
            }
        }

        let rewritten = format!("{}?{}", pq.path(), serializer.finish());
        rewritten.parse().unwrap_or_else(|_| pq.clone())
    }
}
