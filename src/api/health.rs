//! Health check endpoint
//!
//! `/health` reports the service version and whether the storage backend
//! answers. An unreachable backend yields 503 so load balancers drain it.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use raidesk_storage::StorageAdapter;
use serde::Serialize;
use tracing::warn;

use super::response::ApiResponse;
use super::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: StorageHealth,
}

/// Storage backend status
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    pub backend: &'static str,
    pub connected: bool,
}

async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let connected = match state.storage.health_check().await {
        Ok(ok) => ok,
        Err(e) => {
            warn!(error = %e, "Storage health check failed");
            false
        }
    };

    let (status_code, status) = if connected {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status_code,
        Json(ApiResponse::success(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            storage: StorageHealth {
                backend: state.storage.backend_name(),
                connected,
            },
        })),
    )
}

/// Health routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
