use crate::ai::{ToolCall, ToolResponse};
use crate::error::{Error, Result};
use crate::tools::types::{render_result, ToolContext, ToolDefinition};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait that all tools must implement
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool definition for the model
    fn definition(&self) -> ToolDefinition;

    /// Executes the tool with the given parameters
    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value>;

    fn name(&self) -> String {
        self.definition().name
    }
}

/// Registry that holds the tools of one agent.
/// Uses interior mutability (RwLock) so tools can be registered after
/// the registry is shared.
pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        ToolRegistry {
            tools: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if self.tools.write().insert(name.clone(), tool).is_some() {
            log::warn!("[REGISTRY] Tool '{}' registered twice, keeping the latest", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().get(name).cloned()
    }

    /// All tools, sorted by name
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = self.tools.read().values().cloned().collect();
        tools.sort_by_key(|t| t.name());
        tools
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.list().iter().map(|t| t.definition()).collect()
    }

    /// OpenAI-style function schemas for every tool
    pub fn provider_schemas(&self) -> Vec<Value> {
        self.definitions()
            .iter()
            .map(ToolDefinition::provider_schema)
            .collect()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Run a tool by name and return its raw JSON result.
    pub async fn invoke(&self, name: &str, params: Value, context: &ToolContext) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Tool '{}' not found", name)))?;
        tool.execute(params, context).await
    }

    /// Run a model tool call. Failures become error responses for the model.
    pub async fn execute(&self, call: &ToolCall, context: &ToolContext) -> ToolResponse {
        match self.invoke(&call.name, call.arguments.clone(), context).await {
            Ok(value) => ToolResponse::success(call.id.clone(), render_result(&value)),
            Err(e) => {
                log::warn!("[REGISTRY] Tool '{}' failed: {}", call.name, e);
                ToolResponse::error(call.id.clone(), e.to_string())
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
