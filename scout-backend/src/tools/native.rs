//! In-process handlers for `native` tool specs.
//!
//! A spec with `"execution": {"type": "native", "target": "rca.analyze"}`
//! runs the handler registered under `rca.analyze` instead of making an
//! HTTP call.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait NativeHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<Value>;
}

/// Adapter for synchronous closures.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<F> NativeHandler for FnHandler<F>
where
    F: Fn(Value) -> Result<Value> + Send + Sync,
{
    async fn call(&self, args: Value) -> Result<Value> {
        (self.0)(args)
    }
}

#[derive(Clone, Default)]
pub struct NativeRegistry {
    handlers: HashMap<String, Arc<dyn NativeHandler>>,
}

impl NativeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the handlers shipped in this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_fn(crate::rca::NATIVE_TARGET, crate::rca::analyze_tool);
        registry
    }

    pub fn register(&mut self, target: impl Into<String>, handler: Arc<dyn NativeHandler>) {
        self.handlers.insert(target.into(), handler);
    }

    pub fn register_fn<F>(&mut self, target: impl Into<String>, f: F)
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(target, Arc::new(FnHandler(f)));
    }

    pub fn get(&self, target: &str) -> Option<Arc<dyn NativeHandler>> {
        self.handlers.get(target).cloned()
    }

    pub fn targets(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Executor bound to one resolved native handler.
pub struct NativeTool {
    target: String,
    handler: Arc<dyn NativeHandler>,
}

impl NativeTool {
    pub fn resolve(target: Option<&str>, natives: &NativeRegistry) -> Result<Self> {
        let target = target
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::tool_spec("native tools need an execution.target"))?;
        let handler = natives
            .get(target)
            .ok_or_else(|| {
                Error::tool_spec(format!(
                    "Unknown native target: {} (registered: {})",
                    target,
                    natives.targets().join(", ")
                ))
            })?;
        Ok(Self {
            target: target.to_string(),
            handler,
        })
    }

    pub async fn call(&self, params: Value) -> Result<Value> {
        log::debug!("[TOOL] native {}", self.target);
        self.handler.call(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolves_registered_target() {
        let mut natives = NativeRegistry::new();
        natives.register_fn("math.double", |args: Value| {
            let n = args["n"].as_i64().unwrap_or(0);
            Ok(json!(n * 2))
        });

        let tool = NativeTool::resolve(Some("math.double"), &natives).unwrap();
        assert_eq!(tool.call(json!({"n": 21})).await.unwrap(), json!(42));
    }

    #[test]
    fn unknown_or_missing_target_is_rejected() {
        let natives = NativeRegistry::new();
        assert!(NativeTool::resolve(Some("nope"), &natives).is_err());
        assert!(NativeTool::resolve(None, &natives).is_err());
    }

    #[test]
    fn unknown_target_lists_registered_ones() {
        let err = NativeTool::resolve(Some("rca.summary"), &NativeRegistry::with_builtins())
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "invalid tool spec: Unknown native target: rca.summary (registered: rca.analyze)"
        );
    }
}
