//! Tools described by JSON specs and the registry agents call them through.

pub mod dynamic_tool;
pub mod http_tool;
pub mod loader;
pub mod native;
pub mod registry;
pub mod spec;
pub mod types;
pub mod validation;

pub use dynamic_tool::DynamicTool;
pub use http_tool::{expand_env, HttpTool};
pub use loader::{build_tools_from_specs, load_registry};
pub use native::{NativeHandler, NativeRegistry, NativeTool};
pub use registry::{Tool, ToolRegistry};
pub use spec::{load_tool_specs, ExecutionConfig, ToolSpec};
pub use types::{ToolContext, ToolDefinition};
pub use validation::ParamValidator;
