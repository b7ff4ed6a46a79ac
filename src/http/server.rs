//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Build the Axum router (health endpoint + forwarding fallback)
//! - Wire up middleware (tracing, request ID, panic boundary)
//! - Dispatch each request through rewrite → forward → relay
//! - Keep one request's failure contained to that request
//!
//! # Design Decisions
//! - `/healthz` answers locally and never touches the backend
//! - Every other method/path falls through to the proxy handler
//! - The handler returns `Result<_, ProxyError>`; the panic layer catches
//!   anything that escapes, so a single request can never take down the
//!   listener or other in-flight requests

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::forward::{self, HttpClient};
use crate::http::relay;
use crate::http::rewrite::Rewriter;

/// State shared by all request handlers; immutable after startup.
#[derive(Clone)]
pub struct AppState {
    rewriter: Arc<Rewriter>,
    client: HttpClient,
}

/// The identity proxy HTTP server.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create the server from resolved configuration.
    ///
    /// Fails only when the backend URL or auth header value cannot be
    /// turned into request components; callers treat this as a startup
    /// error, the same as a malformed `BACKEND_ENDPOINT`.
    pub fn new(config: ProxyConfig) -> Result<Self, axum::http::Error> {
        let state = AppState {
            rewriter: Arc::new(Rewriter::new(&config)?),
            client: forward::build_client(),
        };
        let router = Self::build_router(state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        layered(
            Router::new()
                // Only GET answers locally; any other method on /healthz is
                // forwarded like every other request.
                .route("/healthz", get(healthz).fallback(proxy_handler))
                .fallback(proxy_handler)
                .with_state(state),
        )
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = %self.config.backend,
            "identity proxy listening"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Middleware stack wrapping every route: per-request panic boundary,
/// request-id set/propagate, request tracing.
fn layered(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Liveness endpoint; independent of backend health.
async fn healthz() -> &'static str {
    "ok"
}

/// Forwarding handler: rewrite the inbound request, send it to the
/// backend, relay the response. Errors map to the proxy's two synthetic
/// responses; everything else passes through verbatim.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(remote_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    tracing::info!(
        method = %request.method(),
        path = %request.uri().path(),
        remote = %remote_addr,
        "incoming request"
    );

    let outbound = state.rewriter.rewrite(request);
    tracing::debug!(target = %outbound.uri(), "forwarding request");

    let response = forward::forward(&state.client, outbound).await?;
    Ok(relay::relay(response))
}

/// Per-request fault boundary: a panic inside one request's handling
/// becomes the generic 500 without terminating the listener.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "opaque panic payload".to_string()
    };
    ProxyError::Internal(detail).into_response()
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
