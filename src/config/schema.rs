//! Configuration schema for dashbot.
//!
//! All structs use `#[serde(rename_all = "camelCase")]` so that the JSON
//! config file can use camelCase keys while Rust code uses snake_case fields.

use serde::{Deserialize, Serialize};

use crate::agent::dispatch::DEFAULT_TOOL_TIMEOUT_MS;
use crate::agent::runner::DEFAULT_MAX_ITERATIONS;
use crate::agent::scratchpad::{DEFAULT_MAX_CHARS, DEFAULT_TAIL_CHARS};
use crate::providers::openai::DEFAULT_AZURE_API_VERSION;

/// LLM provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(default)]
    pub use_azure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_deployment: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_api_version() -> String {
    DEFAULT_AZURE_API_VERSION.to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            api_base: None,
            use_azure: false,
            azure_endpoint: None,
            azure_deployment: None,
            api_version: default_api_version(),
        }
    }
}

/// Agent loop tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    #[serde(default = "default_tool_timeout_ms")]
    pub tool_timeout_ms: u64,
    #[serde(default = "default_scratchpad_max_chars")]
    pub scratchpad_max_chars: usize,
    #[serde(default = "default_scratchpad_tail_chars")]
    pub scratchpad_tail_chars: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_tool_timeout_ms() -> u64 {
    DEFAULT_TOOL_TIMEOUT_MS
}

fn default_scratchpad_max_chars() -> usize {
    DEFAULT_MAX_CHARS
}

fn default_scratchpad_tail_chars() -> usize {
    DEFAULT_TAIL_CHARS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            tool_timeout_ms: default_tool_timeout_ms(),
            scratchpad_max_chars: default_scratchpad_max_chars(),
            scratchpad_tail_chars: default_scratchpad_tail_chars(),
            max_tokens: None,
        }
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}
