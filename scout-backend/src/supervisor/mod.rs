//! Supervisor: routes a query to one or more agents and chains their output.

pub mod router;
pub mod workflow;

pub use router::{KeywordRouter, ModelRouter, Router, PIPELINE_ORDER};
pub use workflow::{extract_first_url, Recipients, ReportWorkflow};

use crate::agents::AgentCatalog;
use scout_types::AgentOutcome;
use std::sync::Arc;

pub struct Supervisor {
    catalog: Arc<AgentCatalog>,
    router: Arc<dyn Router>,
}

impl Supervisor {
    pub fn new(catalog: Arc<AgentCatalog>, router: Arc<dyn Router>) -> Self {
        Self { catalog, router }
    }

    pub fn catalog(&self) -> &Arc<AgentCatalog> {
        &self.catalog
    }

    /// Route the query, run each selected agent in order with the output of
    /// the previous ones as context, and stop at the first failure.
    pub async fn handle(&self, query: &str) -> AgentOutcome {
        let query = query.trim();
        if query.is_empty() {
            return AgentOutcome::error(query, "Query must not be empty");
        }

        let selected = self.router.route(query, &self.catalog).await;
        if selected.is_empty() {
            return AgentOutcome::error(query, "No agent available to handle the query");
        }
        log::info!("[SUPERVISOR] Routing to {}", selected.join(" -> "));

        let mut blocks: Vec<String> = Vec::with_capacity(selected.len());
        for name in &selected {
            let Some(agent) = self.catalog.get(name) else {
                return AgentOutcome::error(query, format!("Agent '{}' is not loaded", name));
            };

            let context = blocks.join("\n\n");
            let context = (!context.is_empty()).then_some(context.as_str());
            match agent.run_with_context(query, context).await {
                Ok(output) => blocks.push(format!("[{}]\n{}", name, output.trim())),
                Err(e) => {
                    log::error!("[SUPERVISOR] {} failed: {}", name, e);
                    return AgentOutcome::error(query, format!("{} failed: {}", name, e));
                }
            }
        }

        AgentOutcome::success(query, blocks.join("\n\n"))
    }
}
