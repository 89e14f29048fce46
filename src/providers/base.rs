//! Base LLM provider interface.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::agent::context::Message;

/// One tool-call request emitted by the model, in OpenAI wire format.
///
/// `arguments` stays a raw JSON string until the dispatcher parses it — a
/// malformed blob from the model must surface as a tool-result error, not as
/// a deserialization failure at the provider layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: String,
}

impl ToolCall {
    /// Build a function-type tool call.
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Response from an LLM provider.
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: String,
}

impl LLMResponse {
    /// Check if the response carries tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Abstract base trait for LLM providers.
///
/// Implementations handle the specifics of each provider's endpoint while
/// keeping a consistent interface. No retry logic lives here — provider
/// failures propagate and are fatal to the current run.
#[async_trait]
pub trait LLMProvider: Send + Sync + std::fmt::Debug {
    /// Send a chat completion request.
    ///
    /// # Arguments
    /// * `messages` - Full conversation context, in order.
    /// * `tools` - Optional tool definitions in OpenAI format; when present
    ///   the request uses `tool_choice: "auto"`.
    /// * `max_tokens` - Optional cap on the response length.
    /// * `temperature` - Sampling temperature (the agent loop always uses 0).
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[serde_json::Value]>,
        max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<LLMResponse>;

    /// The model (or Azure deployment) this provider targets.
    fn model(&self) -> &str;

    /// Short provider identifier for the health endpoint ("openai" / "azure").
    fn provider_name(&self) -> &str;
}
