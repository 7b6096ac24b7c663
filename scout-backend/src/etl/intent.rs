use serde::Serialize;
use serde_json::{json, Map, Value};

/// What the user wants out of the loaded rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    QueryAll,
    QueryActive,
    ReportActive,
}

impl Goal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::QueryAll => "query_all",
            Goal::QueryActive => "query_active",
            Goal::ReportActive => "report_active",
        }
    }

    /// Whether the canned query should keep only `status = 'ACTIVE'` rows.
    pub fn active_only(&self) -> bool {
        matches!(self, Goal::QueryActive | Goal::ReportActive)
    }
}

/// Map free text to fetch parameters and a goal.
pub fn classify(text: &str) -> (Map<String, Value>, Goal) {
    let lowered = text.to_lowercase();
    let mut params = Map::new();
    let mut goal = Goal::QueryAll;
    if lowered.contains("active") {
        params.insert("status".to_string(), json!("ACTIVE"));
        goal = Goal::QueryActive;
        if lowered.contains("report") {
            goal = Goal::ReportActive;
        }
    }
    (params, goal)
}

/// True when the text is a SQL query (starts with `SELECT` or `WITH`).
pub fn is_sql(text: &str) -> bool {
    let first = text
        .trim_start()
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .next()
        .unwrap_or("");
    first.eq_ignore_ascii_case("select") || first.eq_ignore_ascii_case("with")
}
