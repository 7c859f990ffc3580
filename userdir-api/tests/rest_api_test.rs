/// Integration tests for the REST adapter and health probe
///
/// These drive the full router over the in-memory store and verify the
/// JSON wire contract: status codes, error bodies, pagination and search
/// semantics, and the partial-update merge behavior.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user_rest, json_request, request, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_create_normalizes_and_defaults() {
    let ctx = TestContext::new();

    let created = create_user_rest(&ctx, "Ann", "Ann@X.com", 30).await;

    assert!(!created["id"].as_str().unwrap().is_empty());
    assert_eq!(created["email"], "ann@x.com");
    assert_eq!(created["role"], "user");
    assert!(created["createdAt"].is_string());

    // A subsequent GET returns the same record
    let response = ctx
        .send(request(
            "GET",
            &format!("/api/users/{}", created["id"].as_str().unwrap()),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, created);
}

#[tokio::test]
async fn test_create_duplicate_email_is_400() {
    let ctx = TestContext::new();
    create_user_rest(&ctx, "Ann", "Ann@X.com", 30).await;

    let response = ctx
        .send(json_request(
            "POST",
            "/api/users",
            json!({ "name": "Second Ann", "email": "ANN@x.com", "age": 31 }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Email already exists");
}

#[tokio::test]
async fn test_create_validation_failure_is_400() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request(
            "POST",
            "/api/users",
            json!({ "name": "Ann", "email": "ann@x.com", "age": 0 }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Age must be at least 1");
}

#[tokio::test]
async fn test_create_rejects_unknown_role() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request(
            "POST",
            "/api/users",
            json!({ "name": "Ann", "email": "ann@x.com", "age": 30, "role": "superuser" }),
        ))
        .await;

    // Rejected at deserialization, not coerced
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_body_is_400() {
    let ctx = TestContext::new();

    let response = ctx
        .send(
            axum::http::Request::builder()
                .method("POST")
                .uri("/api/users")
                .header("content-type", "application/json")
                .body(axum::body::Body::from("{not json"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_pagination_and_total() {
    let ctx = TestContext::new();
    for i in 0..7 {
        create_user_rest(&ctx, &format!("User {}", i), &format!("user{}@x.com", i), 20 + i).await;
    }

    let response = ctx.send(request("GET", "/api/users?page=2&limit=3")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 3);
    assert_eq!(body["total"], 7);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 3);

    // Non-numeric parameters fall back to the defaults instead of erroring
    let response = ctx
        .send(request("GET", "/api/users?page=abc&limit=xyz"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);

    // This path has no limit ceiling
    let response = ctx.send(request("GET", "/api/users?limit=5000")).await;
    let body = body_json(response).await;
    assert_eq!(body["users"].as_array().unwrap().len(), 7);
    assert_eq!(body["limit"], 5000);
}

#[tokio::test]
async fn test_get_unknown_id_is_404() {
    let ctx = TestContext::new();

    let response = ctx.send(request("GET", "/api/users/000")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_partial_update_only_touches_given_fields() {
    let ctx = TestContext::new();
    let created = create_user_rest(&ctx, "Ann", "ann@x.com", 30).await;
    let id = created["id"].as_str().unwrap();

    let response = ctx
        .send(json_request(
            "PUT",
            &format!("/api/users/{}", id),
            json!({ "role": "admin" }),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let updated = body_json(response).await;
    assert_eq!(updated["role"], "admin");
    assert_eq!(updated["name"], "Ann");
    assert_eq!(updated["email"], "ann@x.com");
    assert_eq!(updated["age"], 30);
}

#[tokio::test]
async fn test_update_unknown_id_is_404() {
    let ctx = TestContext::new();

    let response = ctx
        .send(json_request("PUT", "/api/users/000", json!({ "age": 31 })))
        .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_update_cannot_clear_required_field() {
    let ctx = TestContext::new();
    let created = create_user_rest(&ctx, "Ann", "ann@x.com", 30).await;
    let id = created["id"].as_str().unwrap();

    let response = ctx
        .send(json_request(
            "PUT",
            &format!("/api/users/{}", id),
            json!({ "name": null }),
        ))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Name is required");
}

#[tokio::test]
async fn test_delete_then_get_is_404() {
    let ctx = TestContext::new();
    let created = create_user_rest(&ctx, "Ann", "ann@x.com", 30).await;
    let id = created["id"].as_str().unwrap();

    let response = ctx.send(request("DELETE", &format!("/api/users/{}", id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "User Ann deleted");

    let response = ctx.send(request("GET", &format!("/api/users/{}", id))).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_wildcard_and_case_insensitivity() {
    let ctx = TestContext::new();
    create_user_rest(&ctx, "Ann", "ann@x.com", 30).await;
    create_user_rest(&ctx, "Bob", "bob@y.com", 40).await;

    // Empty query matches the whole collection
    let response = ctx.send(request("GET", "/api/users/search")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);

    let response = ctx.send(request("GET", "/api/users/search?q=ANN")).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["name"], "Ann");

    // Matches on email as well
    let response = ctx.send(request("GET", "/api/users/search?q=y.com")).await;
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["users"][0]["name"], "Bob");
}

#[tokio::test]
async fn test_health_probe_reports_store_state() {
    let ctx = TestContext::new();

    let response = ctx.send(request("GET", "/health")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "userdir");
    assert_eq!(body["mongodb"], "connected");
    assert!(body["timestamp"].is_string());
}
