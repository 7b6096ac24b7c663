use super::AppState;
use axum::extract::State;
use axum::response::Json;
use scout_types::ServiceStatus;
use serde_json::{json, Value};
use std::sync::Arc;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// GET /
pub async fn root() -> Json<Value> {
    Json(json!({"message": "Scout agent service is running"}))
}

// GET /api/health
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": VERSION
    }))
}

// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        running: true,
        version: VERSION.to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        agents: state.catalog().names(),
    })
}
