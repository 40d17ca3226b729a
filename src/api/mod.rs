//! Web API module for RAiDesk
//!
//! Provides REST API endpoints for:
//! - Health and storage status
//! - Sessions
//! - Versioned plans

pub mod health;
pub mod plans;
pub mod response;
pub mod sessions;

use axum::Router;
use raidesk_storage::{PlanRepository, SessionManager, StorageAdapter, StorageConfig};
use std::sync::Arc;

pub use health::health_routes;
pub use plans::plans_routes;
pub use sessions::sessions_routes;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn StorageAdapter>,
    pub sessions: Arc<SessionManager>,
    pub plans: Arc<PlanRepository>,
}

impl AppState {
    /// Build the managers over an already connected backend
    pub fn new(storage: Arc<dyn StorageAdapter>, config: &StorageConfig) -> Self {
        Self {
            sessions: Arc::new(SessionManager::new(
                storage.clone(),
                config.session_ttl_secs,
            )),
            plans: Arc::new(PlanRepository::new(storage.clone(), config.plan_ttl_secs)),
            storage,
        }
    }
}

/// Create the router with all endpoints
pub fn api_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(sessions_routes())
        .merge(plans_routes())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use raidesk_storage::SqliteAdapter;
    use serde_json::Value;
    use tower::ServiceExt;

    pub async fn test_state() -> AppState {
        let storage = Arc::new(SqliteAdapter::connect_in_memory().await.unwrap());
        AppState::new(storage, &StorageConfig::default())
    }

    /// Send one request through the router and decode the JSON body (Null if empty)
    pub async fn send(
        router: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        match body {
            Some(json) => {
                send_raw(router, method, uri, Some("application/json"), &json.to_string()).await
            }
            None => send_raw(router, method, uri, None, "").await,
        }
    }

    /// Send a literal body with an optional content type
    pub async fn send_raw(
        router: Router,
        method: &str,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            request = request.header("content-type", content_type);
        }
        let body = Body::from(body.to_string());

        let response = router.oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
