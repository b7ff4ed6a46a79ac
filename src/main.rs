use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use identity_proxy::config::ProxyConfig;
use identity_proxy::http::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_proxy=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("identity-proxy v0.1.0 starting");

    // Resolve configuration; missing or malformed mandatory settings are
    // fatal before the listener binds.
    let config = match ProxyConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        backend = %config.backend,
        api_version = %config.api_version,
        listen_port = config.listen_port,
        "configuration loaded (auth header value hidden)"
    );

    let server = match HttpServer::new(config.clone()) {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            std::process::exit(1);
        }
    };

    let listener = TcpListener::bind(("0.0.0.0", config.listen_port)).await?;
    server.run(listener).await?;

    tracing::info!("shutdown complete");
    Ok(())
}
