pub mod api;
pub mod catalog;
pub mod config;
pub mod resolver;

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use api::{build_router, AppState};
use catalog::YtMusicClient;
use config::ServerConfig;
use resolver::{build_resolver, utils::build_http_client};

/// Install the fmt subscriber; `RUST_LOG` overrides the default filter
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Wire collaborators from config and serve until Ctrl+C
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let client = build_http_client(config.proxy.as_deref()).context("building HTTP client")?;
    let resolver = build_resolver(&config, client);

    let catalog = YtMusicClient::new(
        config.proxy.as_deref(),
        Duration::from_secs(config.scrape_timeout_secs),
    )
    .context("building music catalog client")?;

    let addr = SocketAddr::new(config.host, config.port);
    let state = AppState {
        catalog: Arc::new(catalog),
        resolver: Arc::new(resolver),
        config: Arc::new(config),
    };

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {}", addr))?;
    tracing::info!("API server listening on http://{}", addr);
    tracing::info!("  GET /trending?region=<CC>");
    tracing::info!("  GET /search?query=<q>&limit=<n>");
    tracing::info!("  GET /play?id=<videoId>");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("running API server")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", err);
    }
    tracing::info!("Shutting down");
}
