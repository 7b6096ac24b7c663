//! Fixed report pipeline: plan → DB → Docs → Comms.

use crate::agents::AgentCatalog;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use scout_types::{PhaseRecord, Status, WorkflowReport};
use serde::Serialize;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

static URL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).expect("url pattern is valid"));
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
});
static CHANNEL_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[CG][A-Z0-9]{8,}$").expect("channel id pattern is valid"));

/// First http(s) URL in `text`, without trailing punctuation.
pub fn extract_first_url(text: &str) -> Option<String> {
    URL_PATTERN
        .find(text)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ';', ':', '!', '?']).to_string())
}

/// Report recipients split by delivery channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Recipients {
    pub emails: Vec<String>,
    /// `#name` channels or channel IDs such as `C09BQEU1HCM`
    pub channels: Vec<String>,
}

impl Recipients {
    /// Parse a free-form list like `"a@x.com, #ops and C09BQEU1HCM"`.
    /// Tokens that are neither are ignored.
    pub fn parse(input: &str) -> Self {
        let mut out = Recipients::default();
        for raw in input.split(|c: char| c == ',' || c == ';' || c.is_whitespace()) {
            let token = raw.trim().trim_end_matches('.');
            if token.is_empty() || token.eq_ignore_ascii_case("and") {
                continue;
            }
            let target = if EMAIL_PATTERN.is_match(token) {
                &mut out.emails
            } else if (token.starts_with('#') && token.len() > 1) || CHANNEL_ID_PATTERN.is_match(token) {
                &mut out.channels
            } else {
                log::debug!("[WORKFLOW] Ignoring recipient token '{}'", token);
                continue;
            };
            if !target.iter().any(|t| t == token) {
                target.push(token.to_string());
            }
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.channels.is_empty()
    }
}

pub struct ReportWorkflow {
    catalog: Arc<AgentCatalog>,
    db_agent: String,
    docs_agent: String,
    comms_agent: String,
}

impl ReportWorkflow {
    pub fn new(catalog: Arc<AgentCatalog>) -> Self {
        Self {
            catalog,
            db_agent: "db_agent".to_string(),
            docs_agent: "docs_agent".to_string(),
            comms_agent: "comms_agent".to_string(),
        }
    }

    async fn run_agent(&self, name: &str, prompt: &str) -> Result<String> {
        let agent = self
            .catalog
            .get(name)
            .ok_or_else(|| Error::not_found(format!("Agent '{}' is not loaded", name)))?;
        agent
            .run(prompt)
            .await
            .map_err(|e| Error::workflow(format!("{} failed: {}", name, e)))
    }

    /// Run every phase in order, stopping at the first failure.
    pub async fn run(&self, query: &str, recipients: &str) -> WorkflowReport {
        let mut phases: Vec<PhaseRecord> = Vec::with_capacity(4);
        let query = query.trim();

        let plan = timed(&mut phases, "plan", async {
            if query.is_empty() {
                return Err(Error::validation("No query provided for the report workflow"));
            }
            let parsed = Recipients::parse(recipients);
            if parsed.is_empty() {
                return Err(Error::validation(format!(
                    "No e-mail address or Slack channel found in recipients '{}'",
                    recipients
                )));
            }
            let plan = json!({
                "query": query,
                "steps": [self.db_agent, self.docs_agent, self.comms_agent],
                "recipients": parsed,
            });
            Ok((plan.to_string(), parsed))
        })
        .await;
        let Some(parsed) = plan.map(|(_, r)| r) else {
            return finish(phases, None);
        };

        let db_data = timed(&mut phases, "db", async {
            let output = self.run_agent(&self.db_agent, query).await?;
            Ok((output.clone(), output))
        })
        .await;
        let Some(db_data) = db_data.map(|(_, d)| d) else {
            return finish(phases, None);
        };

        let docs_prompt = format!(
            "Generate a report for this request.\n\nOriginal query: {}\n\nData results:\n{}",
            query, db_data
        );
        let docs = timed(&mut phases, "docs", async {
            let output = self.run_agent(&self.docs_agent, &docs_prompt).await?;
            Ok((output.clone(), output))
        })
        .await;
        let Some(docs_output) = docs.map(|(_, d)| d) else {
            return finish(phases, None);
        };

        let file_url = extract_first_url(&docs_output);
        if file_url.is_none() {
            log::warn!("[WORKFLOW] Docs output contained no file URL");
        }

        let comms_prompt = format!(
            "Send the generated report to the recipients.\n\n\
             Report: {}\nE-mail recipients: {}\nSlack channels: {}\nFile URL: {}\n\n\
             Report details:\n{}",
            query,
            parsed.emails.join(", "),
            parsed.channels.join(", "),
            file_url.as_deref().unwrap_or("not available"),
            docs_output
        );
        timed(&mut phases, "comms", async {
            let output = self.run_agent(&self.comms_agent, &comms_prompt).await?;
            Ok((output, ()))
        })
        .await;

        finish(phases, file_url)
    }
}

/// Run a phase and record it. The future yields `(recorded_output, value)`.
async fn timed<T, F>(phases: &mut Vec<PhaseRecord>, phase: &str, fut: F) -> Option<(String, T)>
where
    F: Future<Output = Result<(String, T)>>,
{
    let started = Instant::now();
    let result = fut.await;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok((output, value)) => {
            log::info!("[WORKFLOW] Phase {} completed in {}ms", phase, elapsed_ms);
            phases.push(PhaseRecord {
                phase: phase.to_string(),
                status: Status::Success,
                elapsed_ms,
                output: Some(output.clone()),
                error: None,
            });
            Some((output, value))
        }
        Err(e) => {
            log::error!("[WORKFLOW] Phase {} failed: {}", phase, e);
            phases.push(PhaseRecord {
                phase: phase.to_string(),
                status: Status::Error,
                elapsed_ms,
                output: None,
                error: Some(e.to_string()),
            });
            None
        }
    }
}

fn finish(phases: Vec<PhaseRecord>, report_file_url: Option<String>) -> WorkflowReport {
    let failed = phases
        .iter()
        .find(|p| p.status == Status::Error)
        .map(|p| format!("Phase '{}' failed: {}", p.phase, p.error.as_deref().unwrap_or("")));
    WorkflowReport {
        status: if failed.is_some() {
            Status::Error
        } else {
            Status::Success
        },
        phases,
        report_file_url,
        error: failed,
    }
}
