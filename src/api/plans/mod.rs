//! Plans API endpoints
//!
//! POST   /api/plans                 - Save a plan as a new version
//! GET    /api/plans?session_id=     - List plans
//! GET    /api/plans/:id?version=    - Get the current (or a given) version
//! GET    /api/plans/:id/record      - Version history without plan bodies
//! DELETE /api/plans/:id             - Delete a plan and all its versions

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use raidesk_storage::{Plan, PlanRecord, PlanTier};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::response::{ApiError, ApiJson, ApiQuery, ApiResponse, ApiResult};
use super::AppState;

/// Request to save a plan
#[derive(Debug, Deserialize)]
pub struct SavePlanRequest {
    pub plan: Plan,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Description of the change for this version
    #[serde(default)]
    pub modifications: Option<String>,
    /// Reject the save unless this is the stored current version (0 = new plan)
    #[serde(default)]
    pub expected_version: Option<u32>,
}

/// Query parameters for listing plans
#[derive(Debug, Default, Deserialize)]
pub struct ListPlansQuery {
    pub session_id: Option<String>,
}

/// Query parameters for fetching a plan
#[derive(Debug, Default, Deserialize)]
pub struct GetPlanQuery {
    pub version: Option<u32>,
}

/// Plan summary for list view
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub id: String,
    pub tier: PlanTier,
    pub title: String,
    pub session_id: Option<String>,
    pub current_version: u32,
    #[serde(with = "raidesk_storage::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Plan listing
#[derive(Debug, Serialize)]
pub struct PlanList {
    pub plans: Vec<PlanSummary>,
    pub count: usize,
}

/// Version entry without the plan body
#[derive(Debug, Clone, Serialize)]
pub struct VersionSummary {
    pub version: u32,
    pub modifications: Option<String>,
    #[serde(with = "raidesk_storage::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Record metadata and version history
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecordView {
    pub id: String,
    pub session_id: Option<String>,
    pub current_version: u32,
    pub versions: Vec<VersionSummary>,
    #[serde(with = "raidesk_storage::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "raidesk_storage::timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl From<PlanRecord> for PlanRecordView {
    fn from(record: PlanRecord) -> Self {
        Self {
            id: record.id,
            session_id: record.session_id,
            current_version: record.current_version,
            versions: record
                .versions
                .into_iter()
                .map(|v| VersionSummary {
                    version: v.version,
                    modifications: v.modifications,
                    created_at: v.created_at,
                })
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

fn summarize(record: &PlanRecord) -> Option<PlanSummary> {
    let doc = record.current_plan()?.clone();
    match serde_json::from_value::<Plan>(doc) {
        Ok(plan) => Some(PlanSummary {
            id: record.id.clone(),
            tier: plan.tier,
            title: plan.title,
            session_id: record.session_id.clone(),
            current_version: record.current_version,
            created_at: record.created_at,
        }),
        Err(e) => {
            warn!(plan_id = %record.id, error = %e, "Skipping plan with unreadable current version");
            None
        }
    }
}

async fn save_plan(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SavePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlanRecordView>>), ApiError> {
    let session_id = request.session_id.as_deref();
    let modifications = request.modifications.as_deref();

    let record = match request.expected_version {
        Some(expected) => {
            state
                .plans
                .save_expecting(&request.plan, session_id, modifications, expected)
                .await?
        }
        None => state.plans.save(&request.plan, session_id, modifications).await?,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(PlanRecordView::from(record))),
    ))
}

async fn list_plans(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListPlansQuery>,
) -> ApiResult<PlanList> {
    let records = state.plans.list(query.session_id.as_deref()).await?;
    let plans: Vec<PlanSummary> = records.iter().filter_map(summarize).collect();

    Ok(Json(ApiResponse::success(PlanList {
        count: plans.len(),
        plans,
    })))
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<GetPlanQuery>,
) -> ApiResult<Plan> {
    let plan = state.plans.get(&id, query.version).await?;
    Ok(Json(ApiResponse::success(plan)))
}

async fn get_plan_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PlanRecordView> {
    let record = state.plans.get_record(&id).await?;
    Ok(Json(ApiResponse::success(record.into())))
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.plans.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Plan routes
pub fn plans_routes() -> Router<AppState> {
    Router::new()
        .route("/api/plans", get(list_plans).post(save_plan))
        .route("/api/plans/:id", get(get_plan).delete(delete_plan))
        .route("/api/plans/:id/record", get(get_plan_record))
}

#[cfg(test)]
mod tests;
