//! Declarative HTTP executor for `http` tool specs.

use super::spec::{ExecutionConfig, IGNORED_PARAM};
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid")
});

/// Argument keys that may supply the URL when the template expands to nothing.
const URL_ARG_KEYS: [&str; 2] = ["url", "base_url"];

pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Replace every `${NAME}` with `lookup(NAME)`, or `""` when unset.
pub fn expand_env<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            lookup(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

pub struct HttpTool {
    method: Method,
    url_template: String,
    headers: BTreeMap<String, String>,
    query_map: BTreeMap<String, String>,
    body_map: BTreeMap<String, String>,
    timeout: Duration,
    send_raw_json: bool,
    env: EnvLookup,
}

impl HttpTool {
    pub fn new(exec: &ExecutionConfig) -> Result<Self> {
        let method = Method::from_bytes(exec.method.trim().to_uppercase().as_bytes())
            .map_err(|_| Error::tool_spec(format!("invalid HTTP method '{}'", exec.method)))?;
        if !exec.timeout.is_finite() || exec.timeout <= 0.0 {
            return Err(Error::tool_spec(format!(
                "timeout must be a positive number of seconds, got {}",
                exec.timeout
            )));
        }

        Ok(Self {
            method,
            url_template: exec.url.clone(),
            headers: exec.headers.clone(),
            query_map: exec.query_map.clone(),
            body_map: exec.body_map.clone(),
            timeout: Duration::from_secs_f64(exec.timeout),
            send_raw_json: exec.send_raw_json,
            env: Arc::new(|key| std::env::var(key).ok()),
        })
    }

    /// Resolve `${NAME}` placeholders through `lookup` instead of the process environment.
    #[cfg(test)]
    pub(crate) fn with_env_lookup(mut self, lookup: EnvLookup) -> Self {
        self.env = lookup;
        self
    }

    fn is_write(&self) -> bool {
        matches!(
            self.method,
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE
        )
    }

    fn resolve_url(&self, params: &Map<String, Value>) -> Result<String> {
        let expanded = expand_env(&self.url_template, |k| (self.env)(k));
        if !expanded.trim().is_empty() {
            return Ok(expanded);
        }
        URL_ARG_KEYS
            .iter()
            .filter_map(|k| params.get(*k).and_then(Value::as_str))
            .find(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::tool_spec(
                    "No URL resolved: set an env URL or pass 'url'/'base_url' in tool args.",
                )
            })
    }

    fn query_pairs(&self, params: &Map<String, Value>) -> Vec<(String, String)> {
        if self.query_map.is_empty() {
            if self.is_write() {
                return Vec::new();
            }
            return params
                .iter()
                .filter_map(|(k, v)| query_value(v).map(|v| (k.clone(), v)))
                .collect();
        }
        params
            .iter()
            .filter_map(|(k, v)| {
                let mapped = self.query_map.get(k)?;
                if mapped == IGNORED_PARAM {
                    return None;
                }
                query_value(v).map(|v| (mapped.clone(), v))
            })
            .collect()
    }

    fn body(&self, params: &Map<String, Value>) -> Option<Map<String, Value>> {
        if !self.body_map.is_empty() {
            let mapped = params
                .iter()
                .filter_map(|(k, v)| self.body_map.get(k).map(|m| (m.clone(), v.clone())))
                .collect();
            return Some(mapped);
        }
        if self.is_write() {
            return Some(params.clone());
        }
        None
    }

    pub async fn call(&self, params: Value) -> Result<Value> {
        let mut params = match params {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(Error::validation(format!(
                    "tool arguments must be an object, got {}",
                    other
                )));
            }
        };

        let url = self.resolve_url(&params)?;
        for key in URL_ARG_KEYS {
            params.remove(key);
        }

        let client = crate::http::shared_client();
        let mut request = client
            .request(self.method.clone(), &url)
            .timeout(self.timeout);

        for (name, template) in &self.headers {
            request = request.header(name.as_str(), expand_env(template, |k| (self.env)(k)));
        }

        let query = self.query_pairs(&params);
        if !query.is_empty() {
            request = request.query(&query);
        }

        if self.method != Method::GET {
            if let Some(body) = self.body(&params) {
                if self.send_raw_json {
                    request = request.json(&body);
                } else {
                    let form: Vec<(String, String)> = body
                        .iter()
                        .filter_map(|(k, v)| query_value(v).map(|v| (k.clone(), v)))
                        .collect();
                    request = request.form(&form);
                }
            }
        }

        log::debug!("[TOOL] {} {}", self.method, url);

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Query/form representation of a JSON value; nulls are omitted.
fn query_value(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
