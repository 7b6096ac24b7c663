use super::analysis::{analyze, messages_from_value, AnalysisSummary};
use crate::error::{Error, Result};
use crate::tools::{ToolContext, ToolRegistry};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

pub const FETCH_TOOL: &str = "get_slack_messages";
pub const PUBLISH_TOOL: &str = "create_notion_rca";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RcaReport {
    pub channel_id: String,
    pub title: String,
    pub notion_url: Option<String>,
    pub analysis_summary: AnalysisSummary,
    /// The published document rendered as markdown
    pub markdown: String,
}

/// Fetch channel history, build the RCA and publish it, in that order.
pub struct RcaWorkflow {
    tools: Arc<ToolRegistry>,
}

impl RcaWorkflow {
    /// `tools` must provide `get_slack_messages` and `create_notion_rca`.
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    pub async fn run(&self, channel_id: &str, hours_back: u32) -> Result<RcaReport> {
        let channel_id = channel_id.trim();
        if channel_id.is_empty() {
            return Err(Error::validation("channel_id must not be empty"));
        }
        let ctx = ToolContext::new("rca");

        let fetched = self
            .tools
            .invoke(
                FETCH_TOOL,
                json!({"channel_id": channel_id, "hours_back": hours_back}),
                &ctx,
            )
            .await
            .map_err(|e| Error::workflow(format!("Fetch failed: {}", e)))?;
        let messages = messages_from_value(&fetched)
            .map_err(|e| Error::workflow(format!("Fetch failed: {}", e)))?;
        log::info!("[RCA] Fetched {} messages from {}", messages.len(), channel_id);

        let analysis = analyze(channel_id, &messages, Utc::now());
        let title = analysis.rca_template.title.clone();
        let markdown = analysis.rca_template.to_markdown();

        let published = self
            .tools
            .invoke(
                PUBLISH_TOOL,
                json!({
                    "channel_id": channel_id,
                    "template": analysis.rca_template,
                    "title": title,
                }),
                &ctx,
            )
            .await
            .map_err(|e| Error::workflow(format!("Publish failed: {}", e)))?;

        let notion_url = published
            .get("notion_url")
            .and_then(|u| u.as_str())
            .filter(|u| !u.is_empty())
            .map(String::from);
        let success = published
            .get("success")
            .and_then(|s| s.as_bool())
            .unwrap_or(notion_url.is_some());
        if !success {
            return Err(Error::workflow(format!(
                "Publish failed: document was not created ({})",
                published
            )));
        }
        log::info!("[RCA] Published '{}'", title);

        Ok(RcaReport {
            channel_id: channel_id.to_string(),
            title,
            notion_url,
            analysis_summary: analysis.analysis_summary,
            markdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::tools::{Tool, ToolDefinition};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Value;

    struct Canned {
        name: &'static str,
        reply: Value,
        seen: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl Tool for Canned {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: self.name.into(),
                description: String::new(),
                parameters: json!({"type": "object"}),
            }
        }

        async fn execute(&self, params: Value, _ctx: &ToolContext) -> Result<Value> {
            self.seen.lock().push(params);
            Ok(self.reply.clone())
        }
    }

    fn canned(name: &'static str, reply: Value) -> Arc<Canned> {
        Arc::new(Canned {
            name,
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn fetches_analyzes_and_publishes() {
        let fetch = canned(FETCH_TOOL, json!({"messages": [
            {"timestamp": "10:00", "user": "ana", "text": "checkout is down"},
            {"timestamp": "10:20", "user": "ben", "text": "resolved by rollback"}
        ]}));
        let publish = canned(PUBLISH_TOOL, json!({"success": true, "notion_url": "https://notion.so/rca-1"}));
        let tools = Arc::new(ToolRegistry::from_tools(vec![
            fetch.clone() as Arc<dyn Tool>,
            publish.clone(),
        ]));

        let report = RcaWorkflow::new(tools).run("C09BQEU1HCM", 8).await.unwrap();

        assert_eq!(fetch.seen.lock()[0], json!({"channel_id": "C09BQEU1HCM", "hours_back": 8}));
        assert_eq!(report.notion_url.as_deref(), Some("https://notion.so/rca-1"));
        assert_eq!(report.analysis_summary.incidents_found, 1);
        assert_eq!(report.analysis_summary.resolutions_found, 1);
        let sent = &publish.seen.lock()[0];
        assert_eq!(sent["title"], Value::String(report.title.clone()));
        assert_eq!(sent["template"]["sections"]["timeline"]["title"], "## Timeline");
        assert!(report.markdown.starts_with(&format!("# {}\n", report.title)));
        assert!(report.markdown.contains("## Timeline"));
    }

    #[tokio::test]
    async fn stops_when_fetch_reports_error() {
        let publish = canned(PUBLISH_TOOL, json!({"success": true}));
        let tools = Arc::new(ToolRegistry::from_tools(vec![
            canned(FETCH_TOOL, json!({"status": "error", "error": "not_in_channel"})) as Arc<dyn Tool>,
            publish.clone(),
        ]));

        let err = RcaWorkflow::new(tools).run("C1", 24).await.unwrap_err();

        assert!(err.to_string().starts_with("Fetch failed:"));
        assert!(err.to_string().contains("not_in_channel"));
        assert!(publish.seen.lock().is_empty());
    }

    #[tokio::test]
    async fn unsuccessful_publish_is_an_error() {
        let tools = Arc::new(ToolRegistry::from_tools(vec![
            canned(FETCH_TOOL, json!([])) as Arc<dyn Tool>,
            canned(PUBLISH_TOOL, json!({"success": false})),
        ]));
        let err = RcaWorkflow::new(tools).run("C1", 24).await.unwrap_err();
        assert!(err.to_string().starts_with("Publish failed:"));
    }

    #[tokio::test]
    async fn missing_tools_fail_fast() {
        let err = RcaWorkflow::new(Arc::new(ToolRegistry::new()))
            .run("C1", 24)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("get_slack_messages"));
    }
}
