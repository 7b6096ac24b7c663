//! Turns a tools file into invokable tools.

use super::dynamic_tool::DynamicTool;
use super::native::NativeRegistry;
use super::registry::{Tool, ToolRegistry};
use super::spec::{load_tool_specs, ToolSpec};
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Build every spec into a tool. Returns the tools and their provider
/// schemas in spec order. The first broken spec fails the whole batch.
pub fn build_tools_from_specs(
    specs: &[ToolSpec],
    natives: &NativeRegistry,
) -> Result<(Vec<Arc<dyn Tool>>, Vec<Value>)> {
    let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(specs.len());
    let mut schemas = Vec::with_capacity(specs.len());

    for spec in specs {
        let tool = DynamicTool::from_spec(spec, natives)
            .map_err(|e| Error::tool_spec(format!("tool '{}': {}", spec.name, e)))?;
        schemas.push(tool.definition().provider_schema());
        tools.push(Arc::new(tool));
    }

    Ok((tools, schemas))
}

/// Load a tools file straight into a registry.
pub fn load_registry(path: &Path, natives: &NativeRegistry) -> Result<ToolRegistry> {
    let specs = load_tool_specs(path)?;
    let (tools, _) = build_tools_from_specs(&specs, natives)?;
    log::info!("[TOOL] Loaded {} tools from {}", tools.len(), path.display());
    Ok(ToolRegistry::from_tools(tools))
}
