//! Response envelope and error mapping

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use raidesk_storage::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// `{success, data?, error?}` envelope used by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Error on its way out of a handler
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by the storage layer
    Storage(Error),
    /// Request body or query that could not be extracted
    Rejected { status: StatusCode, message: String },
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Storage(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// HTTP status for a storage error
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::SessionNotFound(_) | Error::PlanNotFound { .. } => StatusCode::NOT_FOUND,
        Error::VersionConflict { .. } => StatusCode::CONFLICT,
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Storage(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(error = %err, "Request failed");
                }
                (status, err.to_string())
            }
            Self::Rejected { status, message } => {
                debug!(%status, error = %message, "Rejected request");
                (status, message)
            }
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

/// JSON body extractor whose rejections use the response envelope
pub struct ApiJson<T>(pub T);

#[async_trait::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Query string extractor whose rejections use the response envelope
pub struct ApiQuery<T>(pub T);

#[async_trait::async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// Handler result carrying an enveloped payload
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::SessionNotFound("s".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Error::plan_version_not_found("p", 2)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&Error::VersionConflict {
                id: "p".to_string(),
                expected: 1,
                actual: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&Error::Validation("bad".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&Error::Storage("down".to_string())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_rejection_keeps_status() {
        let response = ApiError::Rejected {
            status: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            message: "Expected request with `Content-Type: application/json`".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let response = ApiError::from(Error::Validation("bad".to_string())).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_error_envelope_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::error("Session not found: s")).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Session not found: s");
        assert!(body.get("data").is_none());
    }
}
