//! HTTP surface of the service.

pub mod health;
pub mod query;
pub mod tools;
pub mod workflows;

use crate::agents::AgentCatalog;
use crate::docplan::DocPlanner;
use crate::etl::EtlFlow;
use crate::rca::RcaWorkflow;
use crate::supervisor::{ReportWorkflow, Supervisor};
use axum::extract::rejection::JsonRejection;
use axum::response::Json;
use axum::routing::{get, post};
use std::sync::Arc;
use std::time::Instant;

pub struct AppState {
    pub supervisor: Supervisor,
    pub report: ReportWorkflow,
    /// Unset when the configured fetch tool is not loaded.
    pub etl: Option<EtlFlow>,
    /// Unset when no agent provides the Slack and Notion tools.
    pub rca: Option<RcaWorkflow>,
    pub docplan: Option<DocPlanner>,
    pub start_time: Instant,
}

impl AppState {
    /// State with only the supervisor and report workflow wired up.
    pub fn new(catalog: Arc<AgentCatalog>, supervisor: Supervisor) -> Self {
        Self {
            supervisor,
            report: ReportWorkflow::new(catalog),
            etl: None,
            rca: None,
            docplan: None,
            start_time: Instant::now(),
        }
    }

    pub fn catalog(&self) -> &Arc<AgentCatalog> {
        self.supervisor.catalog()
    }
}

/// Body of a JSON request, or the reason it was rejected (bad JSON, wrong
/// field types, missing fields, wrong content type).
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, String> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        let reason = rejection.body_text();
        log::warn!("[HTTP] Rejected request body: {}", reason);
        reason
    })
}

pub fn router(state: Arc<AppState>) -> axum::Router {
    let cors = tower_http::cors::CorsLayer::permissive();

    axum::Router::new()
        .route("/", get(health::root))
        .route("/api/health", get(health::health_check))
        .route("/api/status", get(health::status))
        .route("/api/tools", get(tools::list_tools))
        .route("/query", post(query::query))
        .route("/agents/:name/query", post(query::agent_query))
        .route("/etl", post(workflows::etl))
        .route("/workflows/report", post(workflows::report))
        .route("/workflows/rca", post(workflows::rca))
        .route("/workflows/docplan", post(workflows::docplan))
        .with_state(state)
        .layer(cors)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Serve `state` on an ephemeral port; returns the base URL.
    pub async fn spawn(state: AppState) -> String {
        let app = router(Arc::new(state));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}
