//! Root-cause-analysis documents built from a Slack channel's history.

pub mod analysis;
pub mod workflow;

pub use analysis::{
    analyze, messages_from_value, AnalysisSummary, ChannelMessage, RcaAnalysis, RcaSection,
    RcaSections, RcaTemplate,
};
pub use workflow::{RcaReport, RcaWorkflow, FETCH_TOOL, PUBLISH_TOOL};

use crate::error::{Error, Result};
use chrono::Utc;
use serde_json::Value;

/// Native tool target for [`analyze_tool`].
pub const NATIVE_TARGET: &str = "rca.analyze";

/// Tool entry point: `{"channel_id": "...", "messages": [...]}` in, the
/// serialized [`RcaAnalysis`] out.
pub fn analyze_tool(args: Value) -> Result<Value> {
    let channel_id = args
        .get("channel_id")
        .and_then(|c| c.as_str())
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| Error::validation("'channel_id' is required"))?;
    let messages = match args.get("messages") {
        Some(Value::String(raw)) => messages_from_value(&serde_json::from_str(raw)?)?,
        Some(value) => messages_from_value(value)?,
        None => Vec::new(),
    };
    let analysis = analyze(channel_id, &messages, Utc::now());
    Ok(serde_json::to_value(analysis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tool_accepts_inline_or_encoded_messages() {
        let out = analyze_tool(json!({
            "channel_id": "C1",
            "messages": [{"text": "deploy failed"}]
        }))
        .unwrap();
        assert_eq!(out["analysis_summary"]["incidents_found"], 1);

        let out = analyze_tool(json!({
            "channel_id": "C1",
            "messages": "{\"messages\": [{\"text\": \"all fixed\"}]}"
        }))
        .unwrap();
        assert_eq!(out["analysis_summary"]["resolutions_found"], 1);
    }

    #[tokio::test]
    async fn shipped_spec_takes_the_fetch_output_as_is() {
        use crate::tools::{load_registry, NativeRegistry, ToolContext};

        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("agents/summariser/tools.json");
        let registry = load_registry(&path, &NativeRegistry::with_builtins()).unwrap();
        let fetched = json!({"messages": [{"text": "api down"}, {"text": "restored"}]});

        let out = registry
            .invoke(
                "analyze_rca",
                json!({"channel_id": "C1", "messages": fetched}),
                &ToolContext::new("test"),
            )
            .await
            .unwrap();
        assert_eq!(out["analysis_summary"]["incidents_found"], 1);
        assert_eq!(out["analysis_summary"]["resolutions_found"], 1);
    }

    #[test]
    fn tool_requires_channel() {
        assert!(analyze_tool(json!({"messages": []})).is_err());
    }
}
