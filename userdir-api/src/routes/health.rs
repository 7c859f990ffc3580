/// Health probe endpoint
///
/// Reports whether the server is up and whether the record store is
/// reachable right now (live ping, not the state remembered from boot).
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "OK",
///   "service": "userdir",
///   "timestamp": "2024-01-02T03:04:05.000Z",
///   "mongodb": "connected"
/// }
/// ```

use crate::app::AppState;
use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service name reported by the probe
pub const SERVICE_NAME: &str = "userdir";

/// Health probe response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service name
    pub service: String,

    /// Time of the probe
    pub timestamp: DateTime<Utc>,

    /// Record store connectivity: "connected" or "disconnected"
    pub mongodb: String,
}

/// Health probe handler
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let mongodb = if state.directory.ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "OK".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: Utc::now(),
        mongodb: mongodb.to_string(),
    })
}
