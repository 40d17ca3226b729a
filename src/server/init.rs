//! Server initialization and run loop

use super::config::{AppConfig, ServerConfig};
use super::loader::load_config;
use super::shutdown::shutdown_signal;
use super::validation::validate_config;
use crate::api::{api_router, AppState};
use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::Router;
use raidesk_storage::{open_storage, spawn_expiry_sweeper, StorageAdapter};
use std::net::SocketAddr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// CORS layer from the configured origins
pub fn cors_layer(server: &ServerConfig) -> CorsLayer {
    if server.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router with request tracing and CORS
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(server))
}

/// Run the server
pub async fn run() -> Result<()> {
    let config: AppConfig = load_config()?;
    validate_config(&config)?;

    info!(
        "Starting RAiDesk v{} (storage: {})",
        env!("CARGO_PKG_VERSION"),
        config.storage.backend
    );

    let storage = open_storage(&config.storage)
        .await
        .context("Failed to open storage backend")?;

    let shutdown = CancellationToken::new();

    let sweeper = if config.storage.sweep_interval_secs > 0 {
        Some(spawn_expiry_sweeper(
            storage.clone(),
            Duration::from_secs(config.storage.sweep_interval_secs),
            shutdown.clone(),
        ))
    } else {
        info!("Periodic expiry sweep disabled, expired entries are removed on read");
        None
    };

    let state = AppState::new(storage.clone(), &config.storage);
    let app = build_app(state, &config.server);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("HTTP server error")?;

    // The server can also stop without a signal; stop background work either way
    shutdown.cancel();
    if let Some(handle) = sweeper {
        match tokio::time::timeout(Duration::from_secs(5), handle).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Expiry sweeper task error: {}", e),
            Err(_) => warn!("Expiry sweeper shutdown timeout"),
        }
    }

    if let Err(e) = storage.disconnect().await {
        warn!("Failed to disconnect storage: {}", e);
    }

    info!("RAiDesk shutdown complete");
    Ok(())
}
