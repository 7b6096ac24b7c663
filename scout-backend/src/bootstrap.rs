//! Wiring from [`Config`] to a ready-to-serve [`AppState`].

use crate::agents::{AgentCatalog, AgentInfo, CatalogOptions, LoggingObserver};
use crate::ai::{ChatModel, OpenAiClient};
use crate::config::{Config, RouterMode};
use crate::controllers::AppState;
use crate::docplan::{DocPlanner, HttpDocumentServices, TemplateCatalog};
use crate::error::Result;
use crate::etl::{EtlFlow, Fetcher};
use crate::rca::{RcaWorkflow, FETCH_TOOL, PUBLISH_TOOL};
use crate::supervisor::{KeywordRouter, ModelRouter, Router, Supervisor};
use crate::tools::{NativeRegistry, Tool};
use std::sync::Arc;

pub fn default_model(config: &Config) -> Result<OpenAiClient> {
    if config.model.api_key.is_empty() {
        log::warn!("[MODEL] No API key set (SCOUT_MODEL_API_KEY or GOOGLE_API_KEY)");
    }
    Ok(OpenAiClient::from_config(&config.model)?)
}

/// Load every agent under `config.agents_dir`, applying per-agent model and
/// temperature overrides on top of `base`.
pub fn load_catalog(config: &Config, base: &OpenAiClient) -> Result<AgentCatalog> {
    let provider = |info: &AgentInfo| -> Arc<dyn ChatModel> {
        let mut client = match &info.model {
            Some(model) => base.with_model(model),
            None => base.clone(),
        };
        if let Some(temperature) = info.temperature {
            client = client.with_temperature(temperature);
        }
        Arc::new(client)
    };
    let options = CatalogOptions {
        max_iterations: config.max_iterations,
        observers: vec![Arc::new(LoggingObserver)],
    };
    let catalog = AgentCatalog::load(
        &config.agents_dir,
        &provider,
        &NativeRegistry::with_builtins(),
        &options,
    )?;
    log::info!(
        "[AGENT] {} agents loaded from {}: {}",
        catalog.len(),
        config.agents_dir.display(),
        catalog.names().join(", ")
    );
    Ok(catalog)
}

pub fn build_router(config: &Config, model: Arc<dyn ChatModel>) -> Arc<dyn Router> {
    let keywords = KeywordRouter::new(config.default_agent.clone());
    match config.router {
        RouterMode::Keyword => Arc::new(keywords),
        RouterMode::Model => Arc::new(ModelRouter::new(model, keywords)),
    }
}

/// First loaded tool called `name`, searching agents in name order.
pub fn find_tool(catalog: &AgentCatalog, name: &str) -> Option<Arc<dyn Tool>> {
    catalog.agents().find_map(|agent| agent.tools().get(name))
}

pub fn build_etl(config: &Config, catalog: &AgentCatalog, model: Arc<dyn ChatModel>) -> Option<EtlFlow> {
    let Some(tool) = find_tool(catalog, &config.etl_tool) else {
        log::warn!("[ETL] Tool '{}' is not loaded; /etl is disabled", config.etl_tool);
        return None;
    };
    let mut flow = EtlFlow::new(Fetcher::Tool(tool)).with_db_path(&config.etl_db_path);
    if !config.model.api_key.is_empty() {
        flow = flow.with_sql_model(model);
    }
    Some(flow)
}

pub fn build_rca(catalog: &AgentCatalog) -> Option<RcaWorkflow> {
    let agent = catalog
        .agents()
        .find(|a| a.tools().has_tool(FETCH_TOOL) && a.tools().has_tool(PUBLISH_TOOL));
    match agent {
        Some(agent) => {
            log::info!("[RCA] Using tools of {}", agent.name());
            Some(RcaWorkflow::new(agent.tools().clone()))
        }
        None => {
            log::warn!("[RCA] No agent provides {} and {}; /workflows/rca is disabled", FETCH_TOOL, PUBLISH_TOOL);
            None
        }
    }
}

pub fn build_docplan(config: &Config, model: Arc<dyn ChatModel>) -> Result<Option<DocPlanner>> {
    let services = &config.document_services;
    if services.docgen_url.is_empty() {
        log::info!("[DOCS] FOXIT_DOCGEN_URL not set; /workflows/docplan is disabled");
        return Ok(None);
    }
    let templates = match &services.templates_file {
        Some(path) => TemplateCatalog::from_file(path)?,
        None => TemplateCatalog::builtin(),
    };
    Ok(Some(DocPlanner::new(
        model,
        templates,
        Arc::new(HttpDocumentServices::new(services.clone())),
    )))
}

pub fn build_state(config: &Config) -> Result<AppState> {
    let base = default_model(config)?;
    let catalog = Arc::new(load_catalog(config, &base)?);
    let model: Arc<dyn ChatModel> = Arc::new(base);

    let supervisor = Supervisor::new(catalog.clone(), build_router(config, model.clone()));
    let mut state = AppState::new(catalog.clone(), supervisor);
    state.etl = build_etl(config, &catalog, model.clone());
    state.rca = build_rca(&catalog);
    state.docplan = build_docplan(config, model)?;
    Ok(state)
}
