//! Choosing which agents handle a query.

use crate::agents::AgentCatalog;
use crate::ai::{strip_code_fences, ChatModel, Message};
use async_trait::async_trait;
use std::sync::Arc;

/// Agents that form the usual fetch → document → deliver pipeline, in order.
pub const PIPELINE_ORDER: [&str; 3] = ["db_agent", "docs_agent", "comms_agent"];

#[async_trait]
pub trait Router: Send + Sync {
    /// Agent names to run, in execution order. Empty when nothing fits.
    async fn route(&self, query: &str, catalog: &AgentCatalog) -> Vec<String>;
}

fn pipeline_rank(name: &str) -> usize {
    PIPELINE_ORDER
        .iter()
        .position(|p| *p == name)
        .unwrap_or(PIPELINE_ORDER.len())
}

/// Case-insensitive keyword matching against each agent's manifest keywords.
pub struct KeywordRouter {
    default_agent: String,
}

impl KeywordRouter {
    pub fn new(default_agent: impl Into<String>) -> Self {
        Self {
            default_agent: default_agent.into(),
        }
    }

    pub fn select(&self, query: &str, catalog: &AgentCatalog) -> Vec<String> {
        let lowered = query.to_lowercase();
        let mut selected: Vec<String> = catalog
            .agents()
            .filter(|agent| {
                agent
                    .keywords()
                    .iter()
                    .any(|k| !k.is_empty() && lowered.contains(k.as_str()))
            })
            .map(|agent| agent.name().to_string())
            .collect();

        if selected.is_empty() {
            if catalog.contains(&self.default_agent) {
                log::debug!("[ROUTER] No keyword match, using {}", self.default_agent);
                return vec![self.default_agent.clone()];
            }
            return Vec::new();
        }

        selected.sort_by(|a, b| pipeline_rank(a).cmp(&pipeline_rank(b)).then_with(|| a.cmp(b)));
        selected
    }
}

#[async_trait]
impl Router for KeywordRouter {
    async fn route(&self, query: &str, catalog: &AgentCatalog) -> Vec<String> {
        self.select(query, catalog)
    }
}

/// Asks the model for a JSON array of agent names; falls back to keywords.
pub struct ModelRouter {
    model: Arc<dyn ChatModel>,
    fallback: KeywordRouter,
}

impl ModelRouter {
    pub fn new(model: Arc<dyn ChatModel>, fallback: KeywordRouter) -> Self {
        Self { model, fallback }
    }

    fn prompt(catalog: &AgentCatalog) -> String {
        let listing: Vec<String> = catalog
            .agents()
            .map(|a| format!("- {}: {}", a.name(), a.description()))
            .collect();
        format!(
            "You route user requests to agents.\n\
             Available agents:\n{}\n\n\
             Reply with only a JSON array of agent names, in the order they should run.",
            listing.join("\n")
        )
    }

    fn parse(answer: &str, catalog: &AgentCatalog) -> Vec<String> {
        let names: Vec<String> = match serde_json::from_str(&strip_code_fences(answer)) {
            Ok(names) => names,
            Err(e) => {
                log::warn!("[ROUTER] Unparsable routing answer ({}): {}", e, answer);
                return Vec::new();
            }
        };
        let mut out: Vec<String> = Vec::new();
        for name in names {
            if !catalog.contains(&name) {
                log::warn!("[ROUTER] Model picked unknown agent '{}'", name);
                continue;
            }
            if !out.contains(&name) {
                out.push(name);
            }
        }
        out
    }
}

#[async_trait]
impl Router for ModelRouter {
    async fn route(&self, query: &str, catalog: &AgentCatalog) -> Vec<String> {
        let messages = vec![Message::system(Self::prompt(catalog)), Message::user(query)];
        let picked = match self.model.generate_text(messages).await {
            Ok(answer) => Self::parse(&answer, catalog),
            Err(e) => {
                log::warn!("[ROUTER] Model routing failed: {}", e);
                Vec::new()
            }
        };
        if picked.is_empty() {
            return self.fallback.select(query, catalog);
        }
        picked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::Agent;
    use crate::ai::testing::ScriptedModel;
    use crate::ai::AiError;
    use crate::tools::ToolRegistry;

    fn catalog() -> AgentCatalog {
        let model: Arc<dyn ChatModel> = Arc::new(ScriptedModel::texts(&[]));
        let mut catalog = AgentCatalog::new();
        for (name, keywords) in [
            ("comms_agent", vec!["email", "slack", "send"]),
            ("db_agent", vec!["user", "data"]),
            ("docs_agent", vec!["report", "pdf"]),
            ("summariser_agent", vec!["incident"]),
        ] {
            catalog.insert(
                Agent::new(name, "p", model.clone(), Arc::new(ToolRegistry::new()))
                    .with_keywords(keywords.into_iter().map(String::from).collect()),
            );
        }
        catalog
    }

    #[test]
    fn keyword_matches_come_back_in_pipeline_order() {
        let router = KeywordRouter::new("db_agent");
        let picked = router.select("Send an EMAIL with a PDF report of active users", &catalog());
        assert_eq!(picked, vec!["db_agent", "docs_agent", "comms_agent"]);
    }

    #[test]
    fn other_agents_follow_the_pipeline() {
        let router = KeywordRouter::new("db_agent");
        let picked = router.select("incident report", &catalog());
        assert_eq!(picked, vec!["docs_agent", "summariser_agent"]);
    }

    #[test]
    fn no_match_uses_default_agent() {
        assert_eq!(KeywordRouter::new("db_agent").select("hello", &catalog()), vec!["db_agent"]);
        assert!(KeywordRouter::new("ghost").select("hello", &catalog()).is_empty());
    }

    #[tokio::test]
    async fn model_router_drops_unknown_names() {
        let model = Arc::new(ScriptedModel::texts(&["```json\n[\"docs_agent\", \"wizard\", \"docs_agent\", \"db_agent\"]\n```"]));
        let router = ModelRouter::new(model, KeywordRouter::new("db_agent"));
        let picked = router.route("make a report", &catalog()).await;
        assert_eq!(picked, vec!["docs_agent", "db_agent"]);
    }

    #[tokio::test]
    async fn model_router_falls_back_on_garbage_or_error() {
        let router = ModelRouter::new(
            Arc::new(ScriptedModel::texts(&["I think the db agent"])),
            KeywordRouter::new("db_agent"),
        );
        assert_eq!(router.route("send slack", &catalog()).await, vec!["comms_agent"]);

        let router = ModelRouter::new(
            Arc::new(ScriptedModel::new(vec![Err(AiError::new("down"))])),
            KeywordRouter::new("db_agent"),
        );
        assert_eq!(router.route("hello", &catalog()).await, vec!["db_agent"]);
    }
}
