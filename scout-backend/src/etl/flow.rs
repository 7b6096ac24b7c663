//! Fetch → load → query pipeline over a scratch SQLite database.

use super::intent::{classify, is_sql, Goal};
use super::sql::SqlGenerator;
use super::store::ScratchDb;
use crate::agents::Agent;
use crate::ai::{strip_code_fences, ChatModel};
use crate::error::{Error, Result};
use crate::tools::{Tool, ToolContext};
use scout_types::EtlOutput;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Placeholder in user SQL that is replaced by the loaded table name.
pub const TABLE_PLACEHOLDER: &str = "{table}";

/// Where the rows come from.
#[derive(Clone)]
pub enum Fetcher {
    /// Call a tool directly with the parameters derived from the request.
    Tool(Arc<dyn Tool>),
    /// Ask an agent, which must answer with a JSON list.
    Agent(Arc<Agent>),
}

pub struct EtlFlow {
    fetcher: Fetcher,
    db_path: Option<PathBuf>,
    table_type: Option<String>,
    sql: Option<SqlGenerator>,
    // Runs share one scratch file, so they go one at a time.
    run_lock: Mutex<()>,
}

impl EtlFlow {
    /// In-memory scratch database by default.
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            db_path: None,
            table_type: None,
            sql: None,
            run_lock: Mutex::new(()),
        }
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_table_type(mut self, table_type: impl Into<String>) -> Self {
        self.table_type = Some(table_type.into());
        self
    }

    /// Let a model write the SELECT when the request is not SQL.
    pub fn with_sql_model(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.sql = Some(SqlGenerator::new(model));
        self
    }

    pub async fn run(&self, text: &str) -> Result<EtlOutput> {
        let _guard = self.run_lock.lock().await;
        let (params, goal) = classify(text);
        log::info!("[ETL] Goal {} with params {}", goal.as_str(), Value::Object(params.clone()));

        let rows = self
            .fetch(text, params)
            .await
            .map_err(|e| Error::workflow(format!("Fetch failed: {}", e)))?;
        if rows.is_empty() {
            return Err(Error::workflow("No rows returned"));
        }

        let db = match &self.db_path {
            Some(path) => ScratchDb::open(path),
            None => ScratchDb::open_in_memory(),
        }
        .map_err(|e| Error::workflow(format!("Load failed: {}", e)))?;
        let table = db
            .load(&rows, self.table_type.as_deref())
            .map_err(|e| Error::workflow(format!("Load failed: {}", e)))?;

        let result = self.query(&db, &table, text, goal).await;
        if let Err(e) = db.drop_table(&table) {
            log::warn!("[ETL] Could not drop {}: {}", table, e);
        }
        result.map_err(|e| Error::workflow(format!("Query failed: {}", e)))
    }

    async fn fetch(&self, text: &str, params: Map<String, Value>) -> Result<Vec<Map<String, Value>>> {
        let raw = match &self.fetcher {
            Fetcher::Tool(tool) => {
                let ctx = ToolContext::new("etl");
                log::info!("[ETL] Fetching via tool {}", tool.name());
                tool.execute(Value::Object(params), &ctx).await?
            }
            Fetcher::Agent(agent) => {
                log::info!("[ETL] Fetching via agent {}", agent.name());
                Value::String(agent.run(text).await?)
            }
        };
        into_records(raw)
    }

    async fn query(&self, db: &ScratchDb, table: &str, text: &str, goal: Goal) -> Result<EtlOutput> {
        let mut schema = BTreeMap::new();
        let tables = db.table_names()?;
        for name in &tables {
            schema.insert(name.clone(), db.table_info(name)?);
        }

        let sql = if is_sql(text) {
            text.trim().replace(TABLE_PLACEHOLDER, &format!("\"{}\"", table))
        } else if let Some(generator) = &self.sql {
            let columns = schema.get(table).cloned().unwrap_or_default();
            generator.generate(text, &tables, table, &columns).await?
        } else {
            let mut sql = format!("SELECT * FROM \"{}\"", table);
            if goal.active_only() && db.has_column(table, "status")? {
                sql.push_str(" WHERE status = 'ACTIVE'");
            }
            sql
        };
        if !db.is_read_only(&sql) {
            return Err(Error::validation(format!("Refusing to run a statement that writes: {}", sql)));
        }

        let data = db.query(&sql)?;
        log::info!("[ETL] {} rows from: {}", data.len(), sql);
        Ok(EtlOutput {
            tables,
            schema,
            data,
            sql,
        })
    }
}

/// Accepts a JSON array (or a string holding one, possibly fenced) of objects.
fn into_records(raw: Value) -> Result<Vec<Map<String, Value>>> {
    let value = match raw {
        Value::String(s) => serde_json::from_str(&strip_code_fences(&s))
            .map_err(|e| Error::validation(format!("Fetch did not return a list: {}", e)))?,
        other => other,
    };
    let Value::Array(items) = value else {
        return Err(Error::validation("Fetch did not return a list"));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            other => Err(Error::validation(format!(
                "Record {} is not an object: {}",
                i, other
            ))),
        })
        .collect()
}
