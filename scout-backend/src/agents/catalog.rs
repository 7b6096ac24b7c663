//! Agent catalog: scans an agents directory for `agent.toml` manifests.

use super::agent::Agent;
use super::hooks::AgentObserver;
use super::manifest::{AgentInfo, AgentManifest};
use crate::ai::ChatModel;
use crate::error::Result;
use crate::tools::{load_registry, NativeRegistry};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Picks the chat model for an agent (per-agent model/temperature overrides).
pub type ModelProvider<'a> = dyn Fn(&AgentInfo) -> Arc<dyn ChatModel> + Send + Sync + 'a;

/// Settings shared by every agent in the catalog.
pub struct CatalogOptions {
    pub max_iterations: usize,
    pub observers: Vec<Arc<dyn AgentObserver>>,
}

#[derive(Default)]
pub struct AgentCatalog {
    agents: BTreeMap<String, Arc<Agent>>,
}

impl AgentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every agent under `dir`. Subdirectories without a manifest are
    /// skipped; broken manifests or tools files are logged and skipped.
    pub fn load(
        dir: &Path,
        models: &ModelProvider<'_>,
        natives: &NativeRegistry,
        options: &CatalogOptions,
    ) -> Result<Self> {
        let mut catalog = Self::new();

        let entries = std::fs::read_dir(dir)?;
        let mut paths: Vec<_> = entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        paths.sort();

        for path in paths {
            let manifest_path = path.join("agent.toml");
            if !manifest_path.exists() {
                log::debug!("[AGENT] Skipping {}: no agent.toml found", path.display());
                continue;
            }

            match Self::load_one(&path, &manifest_path, models, natives, options) {
                Ok(agent) => {
                    log::info!(
                        "[AGENT] Loaded {} with {} tools from {}",
                        agent.name(),
                        agent.tools().len(),
                        manifest_path.display()
                    );
                    catalog.insert(agent);
                }
                Err(e) => {
                    log::warn!("[AGENT] Failed to load {}: {}", manifest_path.display(), e);
                }
            }
        }

        Ok(catalog)
    }

    fn load_one(
        dir: &Path,
        manifest_path: &Path,
        models: &ModelProvider<'_>,
        natives: &NativeRegistry,
        options: &CatalogOptions,
    ) -> Result<Agent> {
        let manifest = AgentManifest::from_file(manifest_path)?;
        let prompt = manifest.system_prompt(dir)?;
        let tools_path = manifest.tools_path(dir);
        let registry = if tools_path.exists() {
            load_registry(&tools_path, natives)?
        } else {
            log::debug!("[AGENT] {} has no tools file", manifest.agent.name);
            Default::default()
        };

        let mut agent = Agent::new(
            manifest.agent.name.clone(),
            prompt,
            models(&manifest.agent),
            Arc::new(registry),
        )
        .with_description(manifest.agent.description.clone())
        .with_keywords(manifest.agent.keywords.clone())
        .with_max_iterations(manifest.agent.max_iterations.unwrap_or(options.max_iterations));

        for observer in &options.observers {
            agent = agent.with_observer(observer.clone());
        }

        Ok(agent)
    }

    pub fn insert(&mut self, agent: Agent) {
        let name = agent.name().to_string();
        if self.agents.insert(name.clone(), Arc::new(agent)).is_some() {
            log::warn!("[AGENT] Duplicate agent name '{}', keeping the latest", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Agent names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.agents.values()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Provider tool schemas per agent
    pub fn tool_schemas(&self) -> BTreeMap<String, Vec<Value>> {
        self.agents
            .iter()
            .map(|(name, agent)| (name.clone(), agent.tools().provider_schemas()))
            .collect()
    }
}
