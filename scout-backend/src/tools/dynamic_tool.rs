//! DynamicTool: a `Tool` built at runtime from a JSON `ToolSpec`.

use super::http_tool::HttpTool;
use super::native::{NativeRegistry, NativeTool};
use super::registry::Tool;
use super::spec::{ExecutionType, ToolSpec};
use super::types::{ToolContext, ToolDefinition};
use super::validation::ParamValidator;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;

enum Executor {
    Http(HttpTool),
    Native(NativeTool),
}

/// Validates arguments against the spec's schema, then runs its executor.
pub struct DynamicTool {
    definition: ToolDefinition,
    validator: ParamValidator,
    executor: Executor,
}

impl DynamicTool {
    pub fn from_spec(spec: &ToolSpec, natives: &NativeRegistry) -> Result<Self> {
        if spec.name.trim().is_empty() {
            return Err(Error::tool_spec("tool name must not be empty"));
        }

        let executor = match spec.execution.execution_type()? {
            ExecutionType::Http => Executor::Http(HttpTool::new(&spec.execution)?),
            ExecutionType::Native => {
                Executor::Native(NativeTool::resolve(spec.execution.target.as_deref(), natives)?)
            }
        };
        let validator = ParamValidator::new(&spec.name, &spec.parameters)?;

        Ok(Self {
            definition: ToolDefinition {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
            validator,
            executor,
        })
    }
}

#[async_trait]
impl Tool for DynamicTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> Result<Value> {
        let validated = self.validator.validate(params)?;
        log::debug!(
            "[TOOL] {} invoked by {} ({})",
            self.definition.name,
            context.agent,
            context.request_id
        );
        match &self.executor {
            Executor::Http(http) => http.call(validated).await,
            Executor::Native(native) => native.call(validated).await,
        }
    }
}
