#![allow(dead_code)] // each test binary uses its own slice of these helpers

/// Shared test harness for API integration tests
///
/// Builds the full router (REST + SOAP + health) over the in-memory store,
/// so the tests drive real HTTP semantics end to end without external
/// infrastructure. Both protocols run against the same directory instance,
/// which is exactly the production wiring minus MongoDB.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use std::sync::Arc;
use tower::Service as _;
use userdir_api::app::{build_router, AppState};
use userdir_api::config::{ApiConfig, Config, StoreConfig};
use userdir_shared::db::MemoryStore;
use userdir_shared::directory::Directory;

pub struct TestContext {
    pub app: Router,
    pub directory: Directory,
}

impl TestContext {
    pub fn new() -> Self {
        let directory = Directory::new(Arc::new(MemoryStore::new()));
        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            store: StoreConfig {
                uri: "mongodb://unused-in-tests".to_string(),
                database: "userdir-test".to_string(),
            },
        };

        let app = build_router(AppState::new(directory.clone(), config));
        Self { app, directory }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<axum::body::Body> {
        self.app.clone().call(request).await.unwrap()
    }
}

/// Builds a GET/DELETE style request with an empty body
pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Builds a JSON request
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Builds a SOAP POST carrying the given body elements inside an envelope
pub fn soap_request(inner: &str) -> Request<Body> {
    let envelope = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<soapenv:Envelope
  xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/"
  xmlns:usr="http://www.example.com/soap/user">
  <soapenv:Header/>
  <soapenv:Body>{}</soapenv:Body>
</soapenv:Envelope>"#,
        inner
    );

    Request::builder()
        .method("POST")
        .uri("/soap")
        .header("content-type", "text/xml; charset=utf-8")
        .body(Body::from(envelope))
        .unwrap()
}

pub async fn body_text(response: Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

pub async fn body_json(response: Response<axum::body::Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Creates a user through the REST adapter, returning the response body
pub async fn create_user_rest(
    ctx: &TestContext,
    name: &str,
    email: &str,
    age: i64,
) -> serde_json::Value {
    let response = ctx
        .send(json_request(
            "POST",
            "/api/users",
            serde_json::json!({ "name": name, "email": email, "age": age }),
        ))
        .await;

    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await
}
