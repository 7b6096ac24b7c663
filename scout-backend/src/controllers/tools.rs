use super::AppState;
use axum::extract::State;
use axum::response::Json;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

// GET /api/tools
pub async fn list_tools(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, Vec<Value>>> {
    Json(state.catalog().tool_schemas())
}
