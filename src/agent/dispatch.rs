//! Concurrent tool dispatcher.
//!
//! Every tool call the model requests yields exactly one result, in input
//! order, whatever happens: parse failure, missing required argument, unknown
//! tool, handler error, and timeout all become error payloads the model can
//! read. Nothing at this layer aborts the run.

use std::time::Duration;

use futures_util::future::join_all;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::providers::base::ToolCall;
use crate::tools::registry::ToolRegistry;

use super::scratchpad::Scratchpad;

pub const DEFAULT_TOOL_TIMEOUT_MS: u64 = 5000;

/// One settled tool call, ready to fold back as a tool-role message.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub content: String,
}

/// Dispatches tool-call batches against a registry with a per-call timeout.
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    timeout: Duration,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS))
    }
}

impl ToolDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute a batch of tool calls concurrently and wait for all of them.
    ///
    /// Results come back in input order with their request ids. After the
    /// batch settles, one scratchpad entry is appended per call, also in
    /// input order.
    pub async fn dispatch(
        &self,
        registry: &ToolRegistry,
        calls: &[ToolCall],
        scratchpad: &mut Scratchpad,
    ) -> Vec<ToolResult> {
        let futures = calls.iter().map(|call| self.dispatch_one(registry, call));
        let settled = join_all(futures).await;

        let mut results = Vec::with_capacity(settled.len());
        for (call, outcome) in calls.iter().zip(settled) {
            scratchpad.append(&format!(
                "Tool {} called with args {}.\nResult: {}",
                call.function.name, outcome.args_echo, outcome.content
            ));
            results.push(ToolResult {
                tool_call_id: call.id.clone(),
                content: outcome.content,
            });
        }
        results
    }

    async fn dispatch_one(&self, registry: &ToolRegistry, call: &ToolCall) -> Outcome {
        let name = &call.function.name;

        let args = match parse_args(&call.function.arguments) {
            Ok(args) => args,
            Err(msg) => {
                warn!(tool = %name, "tool arguments failed to parse");
                return Outcome::error(call.function.arguments.clone(), msg);
            }
        };
        let args_echo = Value::Object(args.clone()).to_string();

        let tool = match registry.resolve(name) {
            Some(tool) => tool,
            None => {
                warn!(tool = %name, "tool not implemented");
                return Outcome::error(args_echo, format!("Tool '{}' not implemented", name));
            }
        };

        if let Some(missing) = missing_required(tool.parameters(), &args) {
            return Outcome::error(
                args_echo,
                format!("Missing required argument '{}'", missing),
            );
        }

        debug!(tool = %name, "executing tool");
        match tokio::time::timeout(self.timeout, tool.call(args)).await {
            Ok(Ok(value)) => Outcome {
                args_echo,
                content: value.to_string(),
            },
            Ok(Err(e)) => {
                warn!(tool = %name, error = %e, "tool execution failed");
                Outcome::error(args_echo, e.to_string())
            }
            Err(_) => {
                warn!(tool = %name, timeout_ms = self.timeout.as_millis() as u64, "tool execution timed out");
                Outcome::error(args_echo, "Tool execution timed out".to_string())
            }
        }
    }
}

struct Outcome {
    args_echo: String,
    content: String,
}

impl Outcome {
    fn error(args_echo: String, message: String) -> Self {
        Self {
            args_echo,
            content: json!({ "error": message }).to_string(),
        }
    }
}

fn parse_args(raw: &str) -> Result<Map<String, Value>, String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Tool arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("Invalid tool arguments: {}", e)),
    }
}

/// First declared-required argument absent from `args`, if any.
fn missing_required(schema: Value, args: &Map<String, Value>) -> Option<String> {
    schema["required"]
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str())
        .find(|field| !args.contains_key(*field))
        .map(|s| s.to_string())
}
