//! Startup configuration.
//!
//! # Responsibilities
//! - Resolve the four environment inputs once at startup
//! - Parse and validate the backend endpoint URL
//! - Apply defaults for the optional settings
//!
//! # Design Decisions
//! - Config is immutable once resolved; handlers receive it via `Arc`
//! - Mandatory settings missing or malformed abort startup before the
//!   listener binds; there are no runtime configuration errors
//! - Resolution takes a lookup closure so tests inject values without
//!   touching the process environment

use std::fmt;

use thiserror::Error;
use url::Url;

/// api-version substituted when the caller supplied one and
/// `API_VERSION` is unset.
pub const DEFAULT_API_VERSION: &str = "2019-08-01";

/// Port the proxy listens on when `LISTEN_PORT` is unset.
pub const DEFAULT_LISTEN_PORT: u16 = 42300;

/// Process-lifetime proxy configuration, resolved once at startup.
#[derive(Clone)]
pub struct ProxyConfig {
    /// Base URL of the identity backend (scheme + host).
    pub backend: Url,

    /// Secret forwarded to the backend on every request. Never logged.
    pub auth_header_value: String,

    /// Value substituted into the `api-version` query parameter when the
    /// caller already supplied one.
    pub api_version: String,

    /// TCP port the proxy listens on.
    pub listen_port: u16,
}

impl fmt::Debug for ProxyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyConfig")
            .field("backend", &self.backend.as_str())
            .field("auth_header_value", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("listen_port", &self.listen_port)
            .finish()
    }
}

/// Fatal startup configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    MissingVar(&'static str),

    #[error("failed to parse BACKEND_ENDPOINT '{value}': {source}")]
    InvalidEndpoint {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("LISTEN_PORT '{value}' is not a valid TCP port")]
    InvalidPort { value: String },
}

impl ProxyConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::resolve(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary key/value lookup.
    pub fn resolve<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint = require(&lookup, "BACKEND_ENDPOINT")?;
        let backend = Url::parse(&endpoint).map_err(|source| ConfigError::InvalidEndpoint {
            value: endpoint.clone(),
            source,
        })?;
        if backend.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint {
                value: endpoint,
                source: url::ParseError::EmptyHost,
            });
        }

        let auth_header_value = require(&lookup, "AUTH_HEADER_VALUE")?;

        let api_version = match lookup("API_VERSION").filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                tracing::warn!(
                    default = DEFAULT_API_VERSION,
                    "API_VERSION not set, using default"
                );
                DEFAULT_API_VERSION.to_string()
            }
        };

        let listen_port = match lookup("LISTEN_PORT").filter(|v| !v.is_empty()) {
            Some(v) => v
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidPort { value: v })?,
            None => {
                tracing::warn!(
                    default = DEFAULT_LISTEN_PORT,
                    "LISTEN_PORT not set, using default"
                );
                DEFAULT_LISTEN_PORT
            }
        };

        Ok(Self {
            backend,
            auth_header_value,
            api_version,
            listen_port,
        })
    }
}

fn require<F>(lookup: &F, key: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}
