//! Single-hop identity proxy.
//!
//! Sits between a client expecting a cloud identity/metadata endpoint and
//! the real endpoint. Every forwarded request gets the configured auth
//! header injected and, when the caller supplied one, its `api-version`
//! query parameter normalized to the configured value. Responses are
//! relayed verbatim; the proxy only ever synthesizes `502 Bad Gateway`
//! (backend unreachable) and a generic `500` (internal fault).

pub mod config;
pub mod error;
pub mod http;

pub use config::{ConfigError, ProxyConfig};
pub use error::ProxyError;
pub use http::HttpServer;
