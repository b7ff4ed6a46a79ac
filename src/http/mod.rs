//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, healthz, per-request fault boundary)
//!     → rewrite.rs (swap scheme/authority, inject auth header,
//!                   normalize api-version)
//!     → forward.rs (send to the identity backend)
//!     → relay.rs (stream status/headers/body back to the caller)
//! ```

pub mod forward;
pub mod relay;
pub mod rewrite;
pub mod server;

pub use rewrite::{Rewriter, X_IDENTITY_HEADER};
pub use server::HttpServer;
