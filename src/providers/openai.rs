//! OpenAI chat-completions provider.
//!
//! Talks to any OpenAI-compatible chat completions endpoint, with two
//! authentication/routing shapes: direct (Bearer token against
//! `{base}/chat/completions`) and Azure (`api-key` header against the
//! deployment-scoped URL). Failures are typed and fatal to the current run;
//! there is no retry at this layer.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::agent::context::Message;
use crate::errors::ProviderError;

use super::base::{LLMProvider, LLMResponse, ToolCall};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

#[derive(Debug)]
enum Endpoint {
    /// OpenAI-compatible endpoint with Bearer auth.
    Direct { api_base: String },
    /// Azure OpenAI deployment endpoint with api-key auth.
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

#[derive(Debug)]
pub struct OpenAIProvider {
    api_key: String,
    model: String,
    endpoint: Endpoint,
    client: Client,
}

impl OpenAIProvider {
    /// Provider against a direct OpenAI-compatible endpoint.
    pub fn direct(api_key: &str, model: &str, api_base: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: Endpoint::Direct {
                api_base: api_base
                    .unwrap_or(DEFAULT_API_BASE)
                    .trim_end_matches('/')
                    .to_string(),
            },
            client: Client::new(),
        }
    }

    /// Provider against an Azure OpenAI deployment.
    pub fn azure(api_key: &str, endpoint: &str, deployment: &str, api_version: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: deployment.to_string(),
            endpoint: Endpoint::Azure {
                endpoint: endpoint.trim_end_matches('/').to_string(),
                deployment: deployment.to_string(),
                api_version: api_version.to_string(),
            },
            client: Client::new(),
        }
    }

    fn url(&self) -> String {
        match &self.endpoint {
            Endpoint::Direct { api_base } => format!("{}/chat/completions", api_base),
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, deployment, api_version
            ),
        }
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: &[Message],
        tools: Option<&[Value]>,
        max_tokens: Option<u32>,
        temperature: f64,
    ) -> Result<LLMResponse> {
        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": temperature,
        });
        if let Some(max_tokens) = max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(tool_defs) = tools {
            if !tool_defs.is_empty() {
                body["tools"] = Value::Array(tool_defs.to_vec());
                body["tool_choice"] = json!("auto");
            }
        }

        let url = self.url();
        debug!(model = %self.model, messages = messages.len(), "sending chat request");

        let request = match &self.endpoint {
            Endpoint::Direct { .. } => self.client.post(&url).bearer_auth(&self.api_key),
            Endpoint::Azure { .. } => self.client.post(&url).header("api-key", &self.api_key),
        };

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::ResponseReadError(e.to_string()))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "chat request failed");
            let err = if status.as_u16() == 401 || status.as_u16() == 403 {
                ProviderError::AuthError {
                    status: status.as_u16(),
                    message: text,
                }
            } else {
                ProviderError::ServerError {
                    status: status.as_u16(),
                    message: text,
                }
            };
            return Err(err.into());
        }

        let data: Value = serde_json::from_str(&text)
            .map_err(|e| ProviderError::JsonParseError(e.to_string()))?;
        Ok(parse_response(&data)?)
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider_name(&self) -> &str {
        match self.endpoint {
            Endpoint::Direct { .. } => "openai",
            Endpoint::Azure { .. } => "azure",
        }
    }
}

/// Extract the first choice of a chat-completions response body.
fn parse_response(data: &Value) -> Result<LLMResponse, ProviderError> {
    let choice = data
        .get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or(ProviderError::EmptyResponse)?;

    let message = choice.get("message").cloned().unwrap_or_default();
    let finish_reason = choice
        .get("finish_reason")
        .and_then(|v| v.as_str())
        .unwrap_or("stop")
        .to_string();

    let content = message
        .get("content")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string());

    let tool_calls: Vec<ToolCall> = match message.get("tool_calls") {
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::JsonParseError(e.to_string()))?,
        None => Vec::new(),
    };

    Ok(LLMResponse {
        content,
        tool_calls,
        finish_reason,
    })
}
