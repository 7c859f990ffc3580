/// User endpoints (REST adapter)
///
/// Maps HTTP verbs under `/api/users` onto the protocol-agnostic directory
/// core and renders results as JSON. All error translation happens through
/// [`crate::error::ApiError`]; handlers never map status codes themselves.
///
/// # Endpoints
///
/// - `GET    /api/users?page=&limit=` - List one page plus collection total
/// - `GET    /api/users/search?q=`    - Case-insensitive substring search
/// - `GET    /api/users/:id`          - Fetch one user
/// - `POST   /api/users`              - Create (201)
/// - `PUT    /api/users/:id`          - Partial update
/// - `DELETE /api/users/:id`          - Delete with acknowledgement

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use userdir_shared::directory::DEFAULT_PAGE_SIZE;
use userdir_shared::models::{CreateUser, UpdateUser, User};

/// Query parameters for listing
///
/// Kept as raw strings so non-numeric values fall back to the defaults
/// instead of failing extraction.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// 1-based page number
    pub page: Option<String>,

    /// Page size; deliberately uncapped on this path (the SOAP entry point
    /// clamps at 100, REST does not)
    pub limit: Option<String>,
}

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Substring to match against name and email; empty matches everything
    pub q: Option<String>,
}

/// List response
#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersResponse {
    /// One page of users
    pub users: Vec<User>,

    /// Size of the whole collection (not the page)
    pub total: u64,

    /// Effective page number
    pub page: i64,

    /// Effective page size
    pub limit: i64,
}

/// Search response
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchUsersResponse {
    /// Every matching user, unpaginated
    pub users: Vec<User>,

    /// Number of matches returned
    pub total: u64,
}

/// Delete acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub success: bool,
    pub message: String,
}

fn parse_or(value: &Option<String>, default: i64) -> i64 {
    value
        .as_deref()
        .and_then(|raw| raw.parse::<i64>().ok())
        .unwrap_or(default)
        .max(1)
}

/// List users with pagination
///
/// # Endpoint
///
/// ```text
/// GET /api/users?page=2&limit=10
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: store failure
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<ListUsersResponse>> {
    let page = parse_or(&query.page, 1);
    let limit = parse_or(&query.limit, DEFAULT_PAGE_SIZE);

    let result = state.directory.list(Some(page), Some(limit)).await?;

    Ok(Json(ListUsersResponse {
        users: result.users,
        total: result.total,
        page,
        limit,
    }))
}

/// Search users by name or email
///
/// # Endpoint
///
/// ```text
/// GET /api/users/search?q=ann
/// ```
///
/// # Errors
///
/// - `500 Internal Server Error`: store failure
pub async fn search_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchUsersResponse>> {
    let result = state.directory.search(query.q.as_deref().unwrap_or("")).await?;

    Ok(Json(SearchUsersResponse {
        users: result.users,
        total: result.total,
    }))
}

/// Fetch a single user
///
/// # Errors
///
/// - `404 Not Found`: unknown or malformed id (`{"error":"Not found"}`)
/// - `500 Internal Server Error`: store failure
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<User>> {
    let user = state.directory.get(&id).await?;
    Ok(Json(user))
}

/// Create a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/users
/// Content-Type: application/json
///
/// {"name": "Ann", "email": "Ann@X.com", "age": 30}
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unparseable body, validation failure or duplicate
///   email
/// - `500 Internal Server Error`: store failure
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(input) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let created = state.directory.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update an existing user
///
/// Only fields present in the body overwrite stored values; absent fields
/// are preserved, and explicit nulls clear (which required fields reject).
///
/// # Errors
///
/// - `404 Not Found`: unknown or malformed id
/// - `400 Bad Request`: unparseable body or post-merge validation failure
/// - `500 Internal Server Error`: store failure
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUser>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(patch) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let updated = state.directory.update(&id, patch).await?;
    Ok(Json(updated))
}

/// Delete a user
///
/// # Errors
///
/// - `404 Not Found`: unknown or malformed id
/// - `500 Internal Server Error`: store failure
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteUserResponse>> {
    let deleted = state.directory.delete(&id).await?;

    Ok(Json(DeleteUserResponse {
        success: true,
        message: format!("User {} deleted", deleted.name),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_falls_back_on_garbage() {
        assert_eq!(parse_or(&Some("3".to_string()), 1), 3);
        assert_eq!(parse_or(&Some("abc".to_string()), 1), 1);
        assert_eq!(parse_or(&None, 10), 10);
        // Floors at 1 rather than producing negative skips
        assert_eq!(parse_or(&Some("-5".to_string()), 1), 1);
    }
}
