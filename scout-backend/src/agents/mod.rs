//! Tool-using agents configured from `agent.toml` + `tools.json`.

pub mod agent;
pub mod catalog;
pub mod hooks;
pub mod manifest;

pub use agent::{Agent, DEFAULT_MAX_ITERATIONS};
pub use catalog::{AgentCatalog, CatalogOptions, ModelProvider};
pub use hooks::{AgentObserver, LoggingObserver};
pub use manifest::{AgentInfo, AgentManifest};
