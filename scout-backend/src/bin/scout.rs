//! `scout` command line: run agents, tools and workflows without the HTTP server.

use clap::{Parser, Subcommand};
use scout_backend::bootstrap::{build_docplan, build_rca, build_router, default_model, find_tool, load_catalog};
use scout_backend::config::Config;
use scout_backend::etl::{EtlFlow, Fetcher};
use scout_backend::supervisor::{ReportWorkflow, Supervisor};
use scout_backend::tools::ToolContext;
use scout_backend::{Error, Result};
use scout_types::AgentOutcome;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "scout")]
#[command(about = "Run scout agents, tools and workflows from the terminal")]
struct Cli {
    /// Directory of agent folders (agent.toml + tools.json)
    #[arg(long, env = "SCOUT_AGENTS_DIR")]
    agents_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Send a query through the supervisor")]
    Query { text: String },
    #[command(about = "Send a query straight to one agent")]
    Agent {
        #[arg(long)]
        name: String,
        text: String,
    },
    #[command(about = "List loaded agents and their tools")]
    Tools {
        #[arg(long)]
        agent: Option<String>,
    },
    #[command(about = "Call one tool with JSON arguments")]
    Invoke {
        #[arg(long)]
        tool: String,
        #[arg(long, default_value = "{}")]
        args: String,
    },
    #[command(about = "Fetch rows, load them into scratch SQLite and query them")]
    Etl {
        text: String,
        #[arg(long)]
        table_type: Option<String>,
    },
    #[command(about = "Run the DB -> Docs -> Comms report workflow")]
    Report {
        #[arg(long)]
        query: String,
        #[arg(long)]
        recipients: String,
    },
    #[command(about = "Build and publish an RCA for a Slack channel")]
    Rca {
        #[arg(long)]
        channel: String,
        #[arg(long, default_value_t = 24)]
        hours_back: u32,
    },
    #[command(about = "Plan and produce a PDF from a template")]
    Docplan {
        /// JSON file with the document data
        #[arg(long)]
        data: PathBuf,
        #[arg(long)]
        instructions: String,
    },
}

async fn run(cli: Cli) -> Result<Value> {
    let mut config = Config::from_env()?;
    if let Some(dir) = cli.agents_dir {
        config.agents_dir = dir;
    }
    let base = default_model(&config)?;
    let catalog = Arc::new(load_catalog(&config, &base)?);
    let model: Arc<dyn scout_backend::ai::ChatModel> = Arc::new(base);

    match cli.command {
        Command::Query { text } => {
            let supervisor = Supervisor::new(catalog, build_router(&config, model));
            outcome_value(supervisor.handle(&text).await)
        }
        Command::Agent { name, text } => {
            let agent = catalog
                .get(&name)
                .ok_or_else(|| Error::not_found(format!("Agent '{}' is not loaded", name)))?;
            outcome_value(agent.process(&text).await)
        }
        Command::Tools { agent } => {
            let mut listing = serde_json::Map::new();
            for a in catalog.agents().filter(|a| agent.as_deref().is_none_or(|n| n == a.name())) {
                let tools: Vec<Value> = a
                    .tools()
                    .definitions()
                    .into_iter()
                    .map(|d| json!({"name": d.name, "description": d.description}))
                    .collect();
                listing.insert(a.name().to_string(), Value::Array(tools));
            }
            Ok(Value::Object(listing))
        }
        Command::Invoke { tool, args } => {
            let handle = find_tool(&catalog, &tool)
                .ok_or_else(|| Error::not_found(format!("Tool '{}' not found", tool)))?;
            let args: Value = serde_json::from_str(&args)?;
            handle.execute(args, &ToolContext::new("cli")).await
        }
        Command::Etl { text, table_type } => {
            let tool = find_tool(&catalog, &config.etl_tool).ok_or_else(|| {
                Error::not_found(format!("ETL tool '{}' is not loaded", config.etl_tool))
            })?;
            let mut flow = EtlFlow::new(Fetcher::Tool(tool)).with_db_path(&config.etl_db_path);
            if let Some(kind) = table_type {
                flow = flow.with_table_type(kind);
            }
            if !config.model.api_key.is_empty() {
                flow = flow.with_sql_model(model);
            }
            Ok(serde_json::to_value(flow.run(&text).await?)?)
        }
        Command::Report { query, recipients } => {
            let report = ReportWorkflow::new(catalog).run(&query, &recipients).await;
            Ok(serde_json::to_value(report)?)
        }
        Command::Rca { channel, hours_back } => {
            let workflow = build_rca(&catalog)
                .ok_or_else(|| Error::config("No agent provides the Slack and Notion tools"))?;
            Ok(serde_json::to_value(workflow.run(&channel, hours_back).await?)?)
        }
        Command::Docplan { data, instructions } => {
            let planner = build_docplan(&config, model)?
                .ok_or_else(|| Error::config("FOXIT_DOCGEN_URL is not configured"))?;
            let data: Value = serde_json::from_str(&std::fs::read_to_string(&data)?)?;
            Ok(serde_json::to_value(planner.run(&data, &instructions).await?)?)
        }
    }
}

/// Failed outcomes become errors so the process exits non-zero.
fn outcome_value(outcome: AgentOutcome) -> Result<Value> {
    if let Some(error) = outcome.error_message() {
        return Err(Error::workflow(error.to_string()));
    }
    Ok(serde_json::to_value(outcome)?)
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    env_logger::init();

    match run(Cli::parse()).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string()));
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
