//! JSON tool descriptors.
//!
//! A tools file is a JSON array of
//! `{name, description, parameters, execution}` objects. `parameters` is a
//! JSON Schema for the argument object; `execution` says how to run the tool.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder mapping that drops a parameter from the query string.
pub const IGNORED_PARAM: &str = "__ignored__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_parameters")]
    pub parameters: Value,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

fn default_parameters() -> Value {
    json!({"type": "object", "properties": {}})
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// `http` or `native`
    #[serde(rename = "type", default = "default_exec_type")]
    pub exec_type: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// URL template, `${NAME}` placeholders are expanded from the environment
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query_map: BTreeMap<String, String>,
    #[serde(default)]
    pub body_map: BTreeMap<String, String>,
    /// Seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,
    #[serde(default = "default_true")]
    pub send_raw_json: bool,
    /// Native handler name for `native` tools
    #[serde(default)]
    pub target: Option<String>,
}

fn default_exec_type() -> String {
    "http".to_string()
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_timeout() -> f64 {
    20.0
}

fn default_true() -> bool {
    true
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            exec_type: default_exec_type(),
            method: default_method(),
            url: String::new(),
            headers: BTreeMap::new(),
            query_map: BTreeMap::new(),
            body_map: BTreeMap::new(),
            timeout: default_timeout(),
            send_raw_json: true,
            target: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionType {
    Http,
    Native,
}

impl ExecutionConfig {
    pub fn execution_type(&self) -> Result<ExecutionType> {
        match self.exec_type.trim().to_lowercase().as_str() {
            "http" => Ok(ExecutionType::Http),
            "native" => Ok(ExecutionType::Native),
            _ => Err(Error::tool_spec(format!(
                "Unsupported execution type: {}",
                self.exec_type
            ))),
        }
    }
}

impl ToolSpec {
    /// Parse a JSON array of tool specs.
    pub fn parse_list(content: &str) -> Result<Vec<ToolSpec>> {
        serde_json::from_str(content)
            .map_err(|e| Error::tool_spec(format!("tools file is not a valid spec list: {}", e)))
    }
}

/// Read and parse a tools file.
pub fn load_tool_specs(path: &Path) -> Result<Vec<ToolSpec>> {
    let content = std::fs::read_to_string(path)?;
    ToolSpec::parse_list(&content)
        .map_err(|e| Error::tool_spec(format!("{}: {}", path.display(), e)))
}
