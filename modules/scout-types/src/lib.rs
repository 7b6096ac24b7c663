//! Shared types for the scout agent service and its HTTP clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// =====================================================
// Request Types
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub query: String,
    #[serde(default)]
    pub recipients: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcaRequest {
    pub channel_id: String,
    #[serde(default = "default_hours_back")]
    pub hours_back: u32,
}

fn default_hours_back() -> u32 {
    24
}

/// Document data plus free-text instructions for the PDF planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocPlanRequest {
    #[serde(default)]
    pub data: Value,
    pub instructions: String,
}

// =====================================================
// Response Envelopes
// =====================================================

/// Outcome of handing one user query to an agent (or the supervisor).
///
/// Serializes as `{"status": "success", "user_query": .., "response": ..}`
/// or `{"status": "error", "user_query": .., "error": ..}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum AgentOutcome {
    Success { user_query: String, response: String },
    Error { user_query: String, error: String },
}

impl AgentOutcome {
    pub fn success(user_query: impl Into<String>, response: impl Into<String>) -> Self {
        AgentOutcome::Success {
            user_query: user_query.into(),
            response: response.into(),
        }
    }

    pub fn error(user_query: impl Into<String>, error: impl Into<String>) -> Self {
        AgentOutcome::Error {
            user_query: user_query.into(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AgentOutcome::Success { .. })
    }

    /// The response text on success, `None` on error.
    pub fn response(&self) -> Option<&str> {
        match self {
            AgentOutcome::Success { response, .. } => Some(response),
            AgentOutcome::Error { .. } => None,
        }
    }

    /// The error text on failure, `None` on success.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            AgentOutcome::Success { .. } => None,
            AgentOutcome::Error { error, .. } => Some(error),
        }
    }
}

/// Generic `{"status": .., "data"?: .., "error"?: ..}` envelope used by the
/// workflow endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEnvelope<T: Serialize> {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> StatusEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            error: Some(msg.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

// =====================================================
// ETL Output
// =====================================================

/// One row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub notnull: bool,
    pub dflt_value: Option<String>,
    pub pk: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EtlOutput {
    pub tables: Vec<String>,
    pub schema: BTreeMap<String, Vec<ColumnInfo>>,
    pub data: Vec<Map<String, Value>>,
    pub sql: String,
}

// =====================================================
// Workflow Reports
// =====================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: String,
    pub status: Status,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub status: Status,
    pub phases: Vec<PhaseRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// =====================================================
// Service Status
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub version: String,
    pub uptime_secs: u64,
    pub agents: Vec<String>,
}
