use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool definition sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the argument object
    pub parameters: Value,
}

impl ToolDefinition {
    /// OpenAI-style function schema: `{"type":"function","function":{...}}`
    pub fn provider_schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}

/// Per-call context passed to every tool execution
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Name of the agent (or workflow) issuing the call
    pub agent: String,
    pub request_id: String,
}

impl ToolContext {
    pub fn new(agent: impl Into<String>) -> Self {
        ToolContext {
            agent: agent.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Render a tool's JSON result as text for the model.
pub fn render_result(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
