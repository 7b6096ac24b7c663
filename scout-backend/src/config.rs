use crate::error::{Error, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_MODEL_ENDPOINT: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterMode {
    /// Match agent keywords against the query text.
    Keyword,
    /// Ask the model which agents should handle the query.
    Model,
}

impl RouterMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyword" | "keywords" | "string" => Some(RouterMode::Keyword),
            "model" | "llm" => Some(RouterMode::Model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

#[derive(Debug, Clone)]
pub struct DocumentServicesConfig {
    pub docgen_url: String,
    pub pdf_services_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub output_dir: PathBuf,
    pub templates_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub agents_dir: PathBuf,
    pub model: ModelConfig,
    pub router: RouterMode,
    pub default_agent: String,
    pub max_iterations: usize,
    pub etl_db_path: String,
    pub etl_tool: String,
    pub document_services: DocumentServicesConfig,
}

impl Config {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| -> String {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let port = parse_number::<u16>("PORT", &get("PORT", "8000"))?;
        let max_iterations = parse_number::<usize>(
            "SCOUT_MAX_ITERATIONS",
            &get("SCOUT_MAX_ITERATIONS", "10"),
        )?;
        let temperature =
            parse_number::<f32>("SCOUT_MODEL_TEMPERATURE", &get("SCOUT_MODEL_TEMPERATURE", "0"))?;

        let router_raw = get("SCOUT_ROUTER", "keyword");
        let router = RouterMode::from_str(&router_raw)
            .ok_or_else(|| Error::config(format!("SCOUT_ROUTER has unknown value '{}'", router_raw)))?;

        let api_key = lookup("SCOUT_MODEL_API_KEY")
            .or_else(|| lookup("GOOGLE_API_KEY"))
            .unwrap_or_default();

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            agents_dir: PathBuf::from(get("SCOUT_AGENTS_DIR", "./agents")),
            model: ModelConfig {
                endpoint: get("SCOUT_MODEL_ENDPOINT", DEFAULT_MODEL_ENDPOINT),
                model: get("SCOUT_MODEL", DEFAULT_MODEL),
                api_key,
                temperature,
            },
            router,
            default_agent: get("SCOUT_DEFAULT_AGENT", "db_agent"),
            max_iterations,
            etl_db_path: get("SCOUT_ETL_DB_PATH", "./etl_temp.db"),
            etl_tool: get("SCOUT_ETL_TOOL", "db_get_users"),
            document_services: DocumentServicesConfig {
                docgen_url: get("FOXIT_DOCGEN_URL", ""),
                pdf_services_url: get("FOXIT_PDF_SERVICES_URL", ""),
                client_id: get("FOXIT_CLIENT_ID", ""),
                client_secret: get("FOXIT_CLIENT_SECRET", ""),
                output_dir: PathBuf::from(get("SCOUT_DOC_OUTPUT_DIR", "./output")),
                templates_file: lookup("SCOUT_DOC_TEMPLATES").map(PathBuf::from),
            },
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a valid number, got '{}'", key, raw)))
}
