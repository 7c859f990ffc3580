/// Error handling for the REST adapter
///
/// This module provides the error type REST handlers return. It is the only
/// place where the core's `DirectoryError` taxonomy meets HTTP status codes,
/// so the mapping stays exhaustive and in one spot:
///
/// - `Validation` / `Conflict` / unparseable body -> 400
/// - `NotFound` -> 404 with body `{"error":"Not found"}`
/// - `Store` -> 500
///
/// The SOAP adapter has its own mapping onto fault codes and does not go
/// through this type.
///
/// # Example
///
/// ```
/// use userdir_api::error::{ApiError, ApiResult};
/// use axum::Json;
///
/// async fn handler() -> ApiResult<Json<&'static str>> {
///     Err(ApiError::NotFound("Not found".to_string()))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use userdir_shared::directory::DirectoryError;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified REST error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - validation failures, conflicts, unparseable bodies
    BadRequest(String),

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500) - store failures
    Internal(String),
}

/// Error response body
///
/// Every REST failure renders as `{"error": "<message>"}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Convert directory errors to API errors
impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::Validation(message) => ApiError::BadRequest(message),
            DirectoryError::Conflict(message) => ApiError::BadRequest(message),
            DirectoryError::NotFound => ApiError::NotFound("Not found".to_string()),
            DirectoryError::Store(failure) => ApiError::Internal(failure.to_string()),
        }
    }
}
