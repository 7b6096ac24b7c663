//! Observer hooks around the agent loop.

use crate::ai::{AiResponse, ToolCall, ToolResponse};

const PREVIEW_LEN: usize = 200;

/// Receives agent lifecycle events. All methods default to no-ops.
pub trait AgentObserver: Send + Sync {
    fn on_model_start(&self, _agent: &str, _iteration: usize) {}

    fn on_model_end(&self, _agent: &str, _response: &AiResponse) {}

    fn on_tool_start(&self, _agent: &str, _call: &ToolCall) {}

    fn on_tool_end(&self, _agent: &str, _call: &ToolCall, _response: &ToolResponse) {}

    fn on_agent_end(&self, _agent: &str, _result: Result<&str, &str>) {}
}

/// Truncate to `PREVIEW_LEN` characters, appending `…` when cut.
pub fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        return text.to_string();
    }
    let mut out: String = text.chars().take(PREVIEW_LEN).collect();
    out.push('…');
    out
}

/// Observer that logs every event through the `log` facade.
#[derive(Debug, Default)]
pub struct LoggingObserver;

impl AgentObserver for LoggingObserver {
    fn on_model_start(&self, agent: &str, iteration: usize) {
        log::debug!("[LLM START] {} iteration={}", agent, iteration);
    }

    fn on_model_end(&self, agent: &str, response: &AiResponse) {
        log::debug!(
            "[LLM END] {} tool_calls={} stop={}",
            agent,
            response.tool_calls.len(),
            response.stop_reason.as_deref().unwrap_or("-")
        );
    }

    fn on_tool_start(&self, _agent: &str, call: &ToolCall) {
        log::info!(
            "[TOOL START] {} args={}",
            call.name,
            preview(&call.arguments.to_string())
        );
    }

    fn on_tool_end(&self, _agent: &str, call: &ToolCall, response: &ToolResponse) {
        if response.is_error {
            log::warn!("[TOOL END] {} error={}", call.name, preview(&response.content));
        } else {
            log::info!("[TOOL END] {} output={}", call.name, preview(&response.content));
        }
    }

    fn on_agent_end(&self, agent: &str, result: Result<&str, &str>) {
        match result {
            Ok(output) => log::info!("[AGENT END] {} message={}", agent, preview(output)),
            Err(error) => log::error!("[AGENT END] {} error={}", agent, preview(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_keeps_short_text() {
        assert_eq!(preview("short"), "short");
        assert_eq!(preview(&"x".repeat(200)), "x".repeat(200));
    }

    #[test]
    fn preview_truncates_long_text_on_char_boundary() {
        let long = "é".repeat(250);
        let p = preview(&long);
        assert_eq!(p.chars().count(), 201);
        assert!(p.ends_with('…'));
    }
}
