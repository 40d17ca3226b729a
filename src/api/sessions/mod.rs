//! Sessions API endpoints
//!
//! POST   /api/sessions      - Create a session
//! GET    /api/sessions      - List live sessions
//! GET    /api/sessions/:id  - Get a session
//! PUT    /api/sessions/:id  - Merge data into a session
//! DELETE /api/sessions/:id  - Delete a session

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use raidesk_storage::Session;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::response::{ApiError, ApiJson, ApiResponse, ApiResult};
use super::AppState;

/// Request to create a session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Initial data
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

/// Request to update a session
#[derive(Debug, Deserialize)]
pub struct UpdateSessionRequest {
    /// Keys to set; other keys are left alone
    pub data: Map<String, Value>,
}

/// Session listing
#[derive(Debug, Serialize)]
pub struct SessionList {
    pub sessions: Vec<Session>,
    pub count: usize,
}

async fn create_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    let session = state.sessions.create(request.data).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

async fn list_sessions(State(state): State<AppState>) -> ApiResult<SessionList> {
    let sessions = state.sessions.list().await?;
    Ok(Json(ApiResponse::success(SessionList {
        count: sessions.len(),
        sessions,
    })))
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Session> {
    let session = state.sessions.get(&id).await?;
    Ok(Json(ApiResponse::success(session)))
}

async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateSessionRequest>,
) -> ApiResult<Session> {
    let session = state.sessions.update(&id, request.data).await?;
    Ok(Json(ApiResponse::success(session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.sessions.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Session routes
pub fn sessions_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
}
