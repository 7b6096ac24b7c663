//! Agent manifest parser: reads `agent.toml` into typed structs.
//!
//! Each agent lives in its own directory holding the manifest, a tools file
//! and optionally a prompt file:
//!
//! ```toml
//! [agent]
//! name = "db_agent"
//! description = "Fetches user records"
//! keywords = ["user", "data", "database"]
//!
//! [prompt]
//! file = "prompt.md"
//!
//! [tools]
//! file = "tools.json"
//! ```

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AgentManifest {
    pub agent: AgentInfo,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Lowercase words the keyword router matches against queries
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Overrides the service-wide model
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_iterations: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub text: Option<String>,
    /// Path relative to the agent directory
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_tools_file")]
    pub file: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            file: default_tools_file(),
        }
    }
}

fn default_tools_file() -> String {
    "tools.json".to_string()
}

impl AgentManifest {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(content: &str) -> Result<Self> {
        let manifest: AgentManifest = toml::from_str(content)
            .map_err(|e| Error::tool_spec(format!("Failed to parse agent.toml: {}", e)))?;
        if manifest.agent.name.trim().is_empty() {
            return Err(Error::tool_spec("agent.name must not be empty"));
        }
        Ok(manifest)
    }

    /// Resolve the system prompt; inline text wins over a prompt file.
    pub fn system_prompt(&self, agent_dir: &Path) -> Result<String> {
        if let Some(text) = &self.prompt.text {
            return Ok(text.trim().to_string());
        }
        if let Some(file) = &self.prompt.file {
            let path = agent_dir.join(file);
            let content = std::fs::read_to_string(&path).map_err(|e| {
                Error::config(format!("cannot read prompt {}: {}", path.display(), e))
            })?;
            return Ok(content.trim().to_string());
        }
        Ok(format!(
            "You are {}. {}",
            self.agent.name,
            self.agent.description
        )
        .trim()
        .to_string())
    }

    pub fn tools_path(&self, agent_dir: &Path) -> PathBuf {
        agent_dir.join(&self.tools.file)
    }
}
