//! Wired server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wired::config::{self, LogFormat};
use wired::services::RetentionSweeper;
use wired::{api, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = config::init();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "wired=debug,tower_http=debug".into());
    match config.logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting Wired server"
    );

    // Initialize application state
    let state = AppState::new().await?;
    tracing::info!(path = %config.database.path, "Application state initialized");

    api::status::init_startup_time();

    // Start retention sweeper
    let retention_handle = if config.retention.enabled {
        let sweeper = RetentionSweeper::new(state.requests.clone(), &config.retention)
            .context("Invalid retention configuration")?;
        Some(sweeper.start().await)
    } else {
        tracing::debug!("Retention sweeper disabled");
        None
    };

    let app = wired::app(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid listen address")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = retention_handle {
        handle.stop().await;
    }

    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
