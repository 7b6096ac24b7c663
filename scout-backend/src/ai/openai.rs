use crate::ai::types::{AiError, AiResponse, ToolCall, ToolHistoryEntry};
use crate::ai::{ChatModel, Message};
use crate::config::ModelConfig;
use crate::tools::ToolDefinition;
use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Client for any OpenAI-compatible `chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    auth_headers: header::HeaderMap,
    endpoint: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ChatTool>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ChatToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ChatToolFunction,
}

#[derive(Debug, Serialize)]
struct ChatToolFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatToolCall {
    #[serde(default)]
    id: Option<String>,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ChatFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatFunctionCall {
    name: String,
    /// JSON-encoded argument object.
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiClient {
    pub fn new(api_key: &str, endpoint: &str, model: &str) -> Result<Self, AiError> {
        let mut auth_headers = header::HeaderMap::new();
        auth_headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        if !api_key.is_empty() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AiError::new(format!("Invalid API key header: {}", e)))?;
            auth_headers.insert(header::AUTHORIZATION, value);
        }

        Ok(Self {
            client: crate::http::shared_client().clone(),
            auth_headers,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            temperature: 0.0,
        })
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self, AiError> {
        Ok(Self::new(&config.api_key, &config.endpoint, &config.model)?
            .with_temperature(config.temperature))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Same endpoint and credentials, different model or temperature.
    pub fn with_model(&self, model: &str) -> Self {
        let mut client = self.clone();
        client.model = model.to_string();
        client
    }

    fn convert_messages(messages: Vec<Message>, history: &[ToolHistoryEntry]) -> Vec<ChatMessage> {
        let mut api_messages: Vec<ChatMessage> = messages
            .into_iter()
            .map(|m| ChatMessage {
                role: m.role.to_string(),
                content: Some(m.content),
                tool_calls: None,
                tool_call_id: None,
            })
            .collect();

        for entry in history {
            let calls = entry
                .tool_calls
                .iter()
                .map(|tc| ChatToolCall {
                    id: Some(tc.id.clone()),
                    call_type: function_type(),
                    function: ChatFunctionCall {
                        name: tc.name.clone(),
                        arguments: tc.arguments.to_string(),
                    },
                })
                .collect();
            api_messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: None,
                tool_calls: Some(calls),
                tool_call_id: None,
            });
            for response in &entry.tool_responses {
                api_messages.push(ChatMessage {
                    role: "tool".to_string(),
                    content: Some(response.content.clone()),
                    tool_calls: None,
                    tool_call_id: Some(response.tool_call_id.clone()),
                });
            }
        }

        api_messages
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatChoice, AiError> {
        log::debug!(
            "[MODEL] Sending request to {}: {}",
            self.endpoint,
            serde_json::to_string(request).unwrap_or_default()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.auth_headers.clone())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .json(request)
            .send()
            .await
            .map_err(|e| AiError::new(format!("Model API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            if let Ok(body) = serde_json::from_str::<ErrorBody>(&error_text) {
                return Err(AiError::with_status(
                    format!("Model API error: {}", body.error.message),
                    status.as_u16(),
                ));
            }
            return Err(AiError::with_status(
                format!("Model API returned error status: {}, body: {}", status, error_text),
                status.as_u16(),
            ));
        }

        let data: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::new(format!("Failed to parse model response: {}", e)))?;

        data.choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::new("Model API returned no choices"))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn generate_text(&self, messages: Vec<Message>) -> Result<String, AiError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages, &[]),
            temperature: self.temperature,
            tools: None,
        };

        let choice = self.send(&request).await?;
        match choice.message.content {
            Some(content) if !content.is_empty() => Ok(content),
            _ => Err(AiError::new("Model API returned no content")),
        }
    }

    async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        history: Vec<ToolHistoryEntry>,
        tools: Vec<ToolDefinition>,
    ) -> Result<AiResponse, AiError> {
        let chat_tools: Vec<ChatTool> = tools
            .into_iter()
            .map(|t| ChatTool {
                tool_type: "function",
                function: ChatToolFunction {
                    name: t.name,
                    description: t.description,
                    parameters: t.parameters,
                },
            })
            .collect();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: Self::convert_messages(messages, &history),
            temperature: self.temperature,
            tools: if chat_tools.is_empty() {
                None
            } else {
                Some(chat_tools)
            },
        };

        let choice = self.send(&request).await?;

        let mut tool_calls = Vec::new();
        for (idx, call) in choice.message.tool_calls.unwrap_or_default().into_iter().enumerate() {
            let arguments = if call.function.arguments.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    AiError::new(format!(
                        "Tool call '{}' has malformed arguments: {}",
                        call.function.name, e
                    ))
                })?
            };
            tool_calls.push(ToolCall {
                id: call.id.unwrap_or_else(|| format!("call_{}", idx)),
                name: call.function.name,
                arguments,
            });
        }

        let content = choice.message.content.unwrap_or_default();
        if !tool_calls.is_empty() {
            return Ok(AiResponse::with_tools(content, tool_calls));
        }
        Ok(AiResponse {
            content,
            tool_calls,
            stop_reason: choice.finish_reason,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::ToolResponse;
    use axum::{routing::post, Json, Router};
    use serde_json::json;

    async fn serve(reply: Value, status: axum::http::StatusCode) -> String {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |Json(_body): Json<Value>| {
                let reply = reply.clone();
                async move { (status, Json(reply)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/v1/chat/completions", addr)
    }

    #[tokio::test]
    async fn parses_string_encoded_tool_arguments() {
        let endpoint = serve(
            json!({
                "choices": [{
                    "finish_reason": "tool_calls",
                    "message": {
                        "role": "assistant",
                        "content": null,
                        "tool_calls": [{
                            "id": "call_1",
                            "type": "function",
                            "function": {"name": "db_get_users", "arguments": "{\"status\":\"ACTIVE\"}"}
                        }]
                    }
                }]
            }),
            axum::http::StatusCode::OK,
        )
        .await;

        let client = OpenAiClient::new("k", &endpoint, "m").unwrap();
        let response = client
            .generate_with_tools(vec![Message::user("active users")], vec![], vec![])
            .await
            .unwrap();

        assert!(response.has_tool_calls());
        assert_eq!(response.stop_reason.as_deref(), Some("tool_use"));
        assert_eq!(response.tool_calls[0].name, "db_get_users");
        assert_eq!(response.tool_calls[0].arguments, json!({"status": "ACTIVE"}));
    }

    #[tokio::test]
    async fn error_status_is_reported_once() {
        let endpoint = serve(
            json!({"error": {"message": "quota exceeded"}}),
            axum::http::StatusCode::TOO_MANY_REQUESTS,
        )
        .await;

        let client = OpenAiClient::new("", &endpoint, "m").unwrap();
        let err = client
            .generate_text(vec![Message::user("hi")])
            .await
            .unwrap_err();

        assert_eq!(err.status_code, Some(429));
        assert!(err.message.contains("quota exceeded"));
    }

    #[test]
    fn history_becomes_assistant_and_tool_messages() {
        let history = vec![ToolHistoryEntry::new(
            vec![ToolCall {
                id: "c1".into(),
                name: "t".into(),
                arguments: json!({"a": 1}),
            }],
            vec![ToolResponse::success("c1".into(), "ok".into())],
        )];
        let msgs = OpenAiClient::convert_messages(vec![Message::user("q")], &history);
        assert_eq!(msgs.len(), 3);
        assert_eq!(msgs[1].role, "assistant");
        let calls = msgs[1].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, "{\"a\":1}");
        assert_eq!(msgs[2].role, "tool");
        assert_eq!(msgs[2].tool_call_id.as_deref(), Some("c1"));
    }
}
