use super::{json_body, AppState};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use scout_types::{AgentOutcome, QueryRequest};
use std::sync::Arc;

fn bad_request(query: impl Into<String>, error: impl Into<String>) -> (StatusCode, Json<AgentOutcome>) {
    (StatusCode::BAD_REQUEST, Json(AgentOutcome::error(query, error)))
}

fn respond(outcome: AgentOutcome) -> (StatusCode, Json<AgentOutcome>) {
    let status = if outcome.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(outcome))
}

// POST /query
pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> (StatusCode, Json<AgentOutcome>) {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request("", reason),
    };
    if req.query.trim().is_empty() {
        return bad_request(req.query, "Query must not be empty");
    }
    log::info!("[HTTP] /query: {}", req.query);
    respond(state.supervisor.handle(&req.query).await)
}

// POST /agents/:name/query
pub async fn agent_query(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> (StatusCode, Json<AgentOutcome>) {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request("", reason),
    };
    let Some(agent) = state.catalog().get(&name) else {
        return (
            StatusCode::NOT_FOUND,
            Json(AgentOutcome::error(req.query, format!("Agent '{}' is not loaded", name))),
        );
    };
    if req.query.trim().is_empty() {
        return bad_request(req.query, "Query must not be empty");
    }
    log::info!("[HTTP] /agents/{}/query: {}", name, req.query);
    respond(agent.process(&req.query).await)
}
