//! Agent runner: the iteration state machine driving one conversational turn.
//!
//! Each iteration compacts and refreshes the scratchpad, issues one chat call
//! with the full context and tool catalog, then branches on the finish
//! reason: tool calls fold back as tool messages and the loop continues, a
//! stop finishes the turn, anything else is a fatal exit.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AgentError;
use crate::providers::base::LLMProvider;
use crate::tools::registry::ToolRegistry;

use super::context::{build_context, refresh_scratchpad, seed_scratchpad, HistoryEntry, Message};
use super::dispatch::{ToolDispatcher, DEFAULT_TOOL_TIMEOUT_MS};
use super::prompt::DASHBOARD_SYSTEM_PROMPT;
use super::scratchpad::{Scratchpad, DEFAULT_MAX_CHARS, DEFAULT_TAIL_CHARS};

pub const DEFAULT_MAX_ITERATIONS: u32 = 12;

const NO_EXPLANATION: &str = "(No explanation provided)";

/// Classification of one intermediate or final model utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThoughtKind {
    /// First utterance of a run that goes on to call tools.
    Planning,
    /// Utterance accompanying tool calls on later iterations.
    Reasoning,
    /// The terminal answer.
    Final,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thought {
    #[serde(rename = "type")]
    pub kind: ThoughtKind,
    pub content: String,
}

/// Outcome of a completed agent turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub response: String,
    pub thoughts: Vec<Thought>,
    pub is_display: bool,
}

/// Per-run options supplied by the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// Dashboard snapshot seeded into the scratchpad so the model has
    /// situational context without a tool round-trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_state: Option<Value>,
}

/// Tunables for the loop, shared by the CLI and the HTTP gateway.
#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub system_prompt: String,
    pub max_iterations: u32,
    pub max_tokens: Option<u32>,
    pub tool_timeout: Duration,
    pub scratchpad_max_chars: usize,
    pub scratchpad_tail_chars: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            system_prompt: DASHBOARD_SYSTEM_PROMPT.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_tokens: None,
            tool_timeout: Duration::from_millis(DEFAULT_TOOL_TIMEOUT_MS),
            scratchpad_max_chars: DEFAULT_MAX_CHARS,
            scratchpad_tail_chars: DEFAULT_TAIL_CHARS,
        }
    }
}

/// Drives agent turns against a provider and a tool registry.
pub struct AgentRunner {
    provider: Arc<dyn LLMProvider>,
    registry: Arc<ToolRegistry>,
    dispatcher: ToolDispatcher,
    settings: RunnerSettings,
}

impl AgentRunner {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        registry: Arc<ToolRegistry>,
        settings: RunnerSettings,
    ) -> Self {
        let dispatcher = ToolDispatcher::new(settings.tool_timeout);
        Self {
            provider,
            registry,
            dispatcher,
            settings,
        }
    }

    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Run one agent turn to completion.
    ///
    /// Tool-level failures never abort the run; provider failures,
    /// compaction failures, unexpected finish reasons, and iteration
    /// exhaustion do.
    pub async fn run(
        &self,
        user_prompt: &str,
        history: &[HistoryEntry],
        options: &RunOptions,
    ) -> Result<AgentResult> {
        let request_id = Uuid::new_v4().to_string()[..8].to_string();
        info!(
            request_id = %request_id,
            model = self.provider.model(),
            tools = self.registry.len(),
            "agent run started"
        );

        let mut scratchpad = Scratchpad::new(
            seed_scratchpad(user_prompt, options.initial_state.as_ref()),
            self.settings.scratchpad_max_chars,
            self.settings.scratchpad_tail_chars,
        );
        let mut messages = build_context(
            &self.settings.system_prompt,
            history,
            user_prompt,
            scratchpad.content(),
        );
        let definitions = self.registry.definitions();
        let mut thoughts: Vec<Thought> = Vec::new();

        for iteration in 1..=self.settings.max_iterations {
            scratchpad.compact_if_needed(self.provider.as_ref()).await?;
            refresh_scratchpad(&mut messages, scratchpad.content());

            debug!(request_id = %request_id, iteration, "calling model");
            let response = self
                .provider
                .chat(
                    &messages,
                    Some(&definitions),
                    self.settings.max_tokens,
                    0.0,
                )
                .await?;

            if response.finish_reason == "tool_calls" && response.has_tool_calls() {
                let content = response
                    .content
                    .clone()
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| NO_EXPLANATION.to_string());
                let kind = if iteration == 1 {
                    ThoughtKind::Planning
                } else {
                    ThoughtKind::Reasoning
                };
                thoughts.push(Thought { kind, content });

                info!(
                    request_id = %request_id,
                    iteration,
                    calls = response.tool_calls.len(),
                    "dispatching tool calls"
                );
                messages.push(Message::assistant_tool_calls(
                    response.content,
                    response.tool_calls.clone(),
                ));
                let results = self
                    .dispatcher
                    .dispatch(&self.registry, &response.tool_calls, &mut scratchpad)
                    .await;
                for result in results {
                    messages.push(Message::tool(result.tool_call_id, result.content));
                }
                continue;
            }

            if response.finish_reason == "stop" {
                let text = response.content.unwrap_or_default();
                thoughts.push(Thought {
                    kind: ThoughtKind::Final,
                    content: text.clone(),
                });
                scratchpad.append(&format!("Assistant: {}", text));
                messages.push(Message::assistant(text.clone()));
                info!(request_id = %request_id, iteration, "agent run finished");
                return Ok(AgentResult {
                    response: text,
                    thoughts,
                    is_display: true,
                });
            }

            warn!(
                request_id = %request_id,
                iteration,
                finish_reason = %response.finish_reason,
                "unexpected finish reason"
            );
            return Err(AgentError::UnexpectedAgentExit(response.finish_reason).into());
        }

        warn!(request_id = %request_id, "iteration limit exceeded");
        Err(AgentError::IterationLimitExceeded(self.settings.max_iterations).into())
    }
}
