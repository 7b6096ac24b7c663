use super::hooks::AgentObserver;
use crate::ai::{ChatModel, Message, ToolHistoryEntry};
use crate::error::{Error, Result};
use crate::tools::{ToolContext, ToolRegistry};
use scout_types::AgentOutcome;
use std::sync::Arc;

pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// A system prompt and a tool set bound to a chat model.
pub struct Agent {
    name: String,
    description: String,
    keywords: Vec<String>,
    system_prompt: String,
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    max_iterations: usize,
    observers: Vec<Arc<dyn AgentObserver>>,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: Arc<dyn ChatModel>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            keywords: Vec::new(),
            system_prompt: system_prompt.into(),
            model,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            observers: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn AgentObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Answer a single query.
    pub async fn run(&self, query: &str) -> Result<String> {
        self.run_with_context(query, None).await
    }

    /// Answer a query with extra context (e.g. output of earlier agents)
    /// placed ahead of the task in the user message.
    pub async fn run_with_context(&self, query: &str, context: Option<&str>) -> Result<String> {
        let user_content = match context.filter(|c| !c.trim().is_empty()) {
            Some(ctx) => format!("Context from previous steps:\n{}\n\nTask:\n{}", ctx, query),
            None => query.to_string(),
        };
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(user_content),
        ];

        let result = self.react_loop(messages).await;
        for observer in &self.observers {
            match &result {
                Ok(output) => observer.on_agent_end(&self.name, Ok(output)),
                Err(e) => observer.on_agent_end(&self.name, Err(&e.to_string())),
            }
        }
        result
    }

    async fn react_loop(&self, messages: Vec<Message>) -> Result<String> {
        let definitions = self.tools.definitions();
        let context = ToolContext::new(&self.name);
        let mut history: Vec<ToolHistoryEntry> = Vec::new();

        for iteration in 0..self.max_iterations {
            for observer in &self.observers {
                observer.on_model_start(&self.name, iteration);
            }

            let response = self
                .model
                .generate_with_tools(messages.clone(), history.clone(), definitions.clone())
                .await?;

            for observer in &self.observers {
                observer.on_model_end(&self.name, &response);
            }

            if !response.has_tool_calls() {
                return Ok(response.content);
            }

            let mut responses = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                for observer in &self.observers {
                    observer.on_tool_start(&self.name, call);
                }
                let tool_response = self.tools.execute(call, &context).await;
                for observer in &self.observers {
                    observer.on_tool_end(&self.name, call, &tool_response);
                }
                responses.push(tool_response);
            }
            history.push(ToolHistoryEntry::new(response.tool_calls, responses));
        }

        Err(Error::workflow(format!(
            "Agent '{}' reached {} iterations without a final answer",
            self.name, self.max_iterations
        )))
    }

    /// Run and wrap the result in the `{status, user_query, ...}` envelope.
    pub async fn process(&self, query: &str) -> AgentOutcome {
        if query.trim().is_empty() {
            return AgentOutcome::error(query, "Query must not be empty");
        }
        match self.run(query).await {
            Ok(response) => AgentOutcome::success(query, response),
            Err(e) => AgentOutcome::error(query, e.to_string()),
        }
    }
}
