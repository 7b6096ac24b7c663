use super::{json_body, AppState};
use crate::docplan::DocPlanResult;
use crate::error::Error;
use crate::rca::RcaReport;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use scout_types::{
    DocPlanRequest, EtlOutput, QueryRequest, RcaRequest, ReportRequest, Status, StatusEnvelope,
    WorkflowReport,
};
use serde::Serialize;
use std::sync::Arc;

type Envelope<T> = (StatusCode, Json<StatusEnvelope<T>>);

fn error_status(e: &Error) -> StatusCode {
    match e {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn envelope<T: Serialize>(result: crate::Result<T>) -> Envelope<T> {
    match result {
        Ok(data) => (StatusCode::OK, Json(StatusEnvelope::ok(data))),
        Err(e) => {
            log::error!("[HTTP] {}", e);
            (error_status(&e), Json(StatusEnvelope::err(e.to_string())))
        }
    }
}

fn bad_request<T: Serialize>(reason: String) -> Envelope<T> {
    (StatusCode::BAD_REQUEST, Json(StatusEnvelope::err(reason)))
}

fn unavailable<T: Serialize>(what: &str) -> Envelope<T> {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(StatusEnvelope::err(format!("{} is not configured", what))),
    )
}

// POST /etl
pub async fn etl(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Envelope<EtlOutput> {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request(reason),
    };
    let Some(flow) = &state.etl else {
        return unavailable("ETL");
    };
    if req.query.trim().is_empty() {
        return bad_request("Query must not be empty".to_string());
    }
    envelope(flow.run(&req.query).await)
}

// POST /workflows/report
pub async fn report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Response {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request::<WorkflowReport>(reason).into_response(),
    };
    let report = state.report.run(&req.query, &req.recipients).await;
    let status = match report.status {
        Status::Success => StatusCode::OK,
        // only the plan phase ran: the request itself was unusable
        Status::Error if report.phases.len() == 1 => StatusCode::BAD_REQUEST,
        Status::Error => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(report)).into_response()
}

// POST /workflows/rca
pub async fn rca(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RcaRequest>, JsonRejection>,
) -> Envelope<RcaReport> {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request(reason),
    };
    let Some(workflow) = &state.rca else {
        return unavailable("RCA workflow");
    };
    envelope(workflow.run(&req.channel_id, req.hours_back).await)
}

// POST /workflows/docplan
pub async fn docplan(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<DocPlanRequest>, JsonRejection>,
) -> Envelope<DocPlanResult> {
    let req = match json_body(payload) {
        Ok(req) => req,
        Err(reason) => return bad_request(reason),
    };
    let Some(planner) = &state.docplan else {
        return unavailable("Document planner");
    };
    envelope(planner.run(&req.data, &req.instructions).await)
}
