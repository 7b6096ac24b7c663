pub mod openai;
pub mod types;

pub use openai::OpenAiClient;
pub use types::{AiError, AiResponse, ToolCall, ToolHistoryEntry, ToolResponse};

use crate::tools::ToolDefinition;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// A hosted chat model that agents, routers and planners talk to.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Plain completion without tools.
    async fn generate_text(&self, messages: Vec<Message>) -> Result<String, AiError>;

    /// Completion that may request tool calls. `history` carries earlier
    /// rounds of tool calls and their responses.
    async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        history: Vec<ToolHistoryEntry>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, AiError>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}

/// Remove a surrounding ``` fence (with optional `json`/`sql` tag) from model output.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    // the tag is a whole word right after the opening fence
    let body = match inner.split_once(char::is_whitespace) {
        Some((tag, rest)) if tag.eq_ignore_ascii_case("json") || tag.eq_ignore_ascii_case("sql") => rest,
        _ => inner,
    };
    body.trim().to_string()
}

#[cfg(test)]
pub mod testing {
    //! Scripted model used by agent, router and workflow tests.

    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    pub struct ScriptedModel {
        replies: Mutex<VecDeque<Result<AiResponse, AiError>>>,
        pub seen: Mutex<Vec<Vec<Message>>>,
    }

    impl ScriptedModel {
        pub fn new(replies: Vec<Result<AiResponse, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn texts(texts: &[&str]) -> Self {
            Self::new(
                texts
                    .iter()
                    .map(|t| Ok(AiResponse::text(t.to_string())))
                    .collect(),
            )
        }

        fn next(&self, messages: Vec<Message>) -> Result<AiResponse, AiError> {
            self.seen.lock().push(messages);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::new("script exhausted")))
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn generate_text(&self, messages: Vec<Message>) -> Result<String, AiError> {
            self.next(messages).map(|r| r.content)
        }

        async fn generate_with_tools(
            &self,
            messages: Vec<Message>,
            _history: Vec<ToolHistoryEntry>,
            _tools: Vec<ToolDefinition>,
        ) -> Result<AiResponse, AiError> {
            self.next(messages)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    pub fn call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }
}
