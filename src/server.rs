//! HTTP gateway for running the agent behind a remote split: the server owns
//! the provider and issues LLM calls, the client executes tool calls and
//! posts the results back.
//!
//! Routes:
//! - `POST /api/agent/run` — start a turn; returns either the final result or
//!   a batch of tool calls for the client to execute.
//! - `POST /api/agent/tool-result` — fold client-side tool results back and
//!   issue the next chat call.
//! - `GET /api/health` — liveness plus provider identity.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::agent::context::{build_context, refresh_scratchpad, seed_scratchpad, HistoryEntry, Message};
use crate::agent::prompt::DASHBOARD_SYSTEM_PROMPT;
use crate::agent::runner::{AgentResult, RunOptions, Thought, ThoughtKind};
use crate::agent::scratchpad::Scratchpad;
use crate::config::schema::Config;
use crate::errors::AgentError;
use crate::providers::base::{LLMProvider, ToolCall};
use crate::tools::registry::ToolRegistry;

pub const AGENT_RUN_PATH: &str = "/api/agent/run";
pub const TOOL_RESULT_PATH: &str = "/api/agent/tool-result";
pub const HEALTH_PATH: &str = "/api/health";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn LLMProvider>,
    pub registry: Arc<ToolRegistry>,
    pub config: Arc<Config>,
}

/// Build the gateway router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(AGENT_RUN_PATH, post(agent_run))
        .route(TOOL_RESULT_PATH, post(tool_result))
        .route(HEALTH_PATH, get(health))
        .with_state(state)
}

/// Fatal errors map to HTTP 500 with a JSON `error` body.
struct ApiError(anyhow::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

// ---------------------------------------------------------------------------
// POST /api/agent/run
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    user_prompt: String,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    options: RunOptions,
    #[serde(default)]
    system_prompt: Option<String>,
    #[serde(default)]
    tools: Option<Vec<Value>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RunResponse {
    ToolCalls {
        #[serde(rename = "toolCalls")]
        tool_calls: Vec<ToolCall>,
        thoughts: Vec<Thought>,
        messages: Vec<Message>,
    },
    Final {
        response: AgentResult,
    },
}

/// Start an agent turn.
///
/// Issues exactly one chat call. When the model requests tools, the assistant
/// message is appended and the whole context is handed to the client, which
/// executes the calls and continues via the tool-result endpoint.
async fn agent_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunResponse>, ApiError> {
    info!(
        history = request.history.len(),
        "agent run request received"
    );

    let system_prompt = request
        .system_prompt
        .as_deref()
        .unwrap_or(DASHBOARD_SYSTEM_PROMPT);
    let definitions = request
        .tools
        .unwrap_or_else(|| state.registry.definitions());

    let mut scratchpad = Scratchpad::new(
        seed_scratchpad(&request.user_prompt, request.options.initial_state.as_ref()),
        state.config.agent.scratchpad_max_chars,
        state.config.agent.scratchpad_tail_chars,
    );
    let mut messages = build_context(
        system_prompt,
        &request.history,
        &request.user_prompt,
        scratchpad.content(),
    );

    scratchpad
        .compact_if_needed(state.provider.as_ref())
        .await?;
    refresh_scratchpad(&mut messages, scratchpad.content());

    let response = state
        .provider
        .chat(
            &messages,
            Some(&definitions),
            state.config.agent.max_tokens,
            0.0,
        )
        .await?;

    if response.finish_reason == "tool_calls" && response.has_tool_calls() {
        let content = response
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "(No explanation provided)".to_string());
        let thoughts = vec![Thought {
            kind: ThoughtKind::Planning,
            content,
        }];
        let tool_calls = response.tool_calls.clone();
        messages.push(Message::assistant_tool_calls(
            response.content,
            response.tool_calls,
        ));
        info!(calls = tool_calls.len(), "returning tool calls to client");
        return Ok(Json(RunResponse::ToolCalls {
            tool_calls,
            thoughts,
            messages,
        }));
    }

    if response.finish_reason == "stop" {
        let text = response.content.unwrap_or_default();
        let thoughts = vec![Thought {
            kind: ThoughtKind::Final,
            content: text.clone(),
        }];
        info!("returning final response");
        return Ok(Json(RunResponse::Final {
            response: AgentResult {
                response: text,
                thoughts,
                is_display: true,
            },
        }));
    }

    Err(AgentError::UnexpectedAgentExit(response.finish_reason).into())
}

// ---------------------------------------------------------------------------
// POST /api/agent/tool-result
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolResultRequest {
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    tool_results: Vec<Message>,
    #[serde(default)]
    scratchpad: String,
    #[serde(default)]
    tools: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct ToolResultResponse {
    message: Message,
}

/// Fold client-side tool results back into the context and continue.
async fn tool_result(
    State(state): State<AppState>,
    Json(request): Json<ToolResultRequest>,
) -> Result<Json<ToolResultResponse>, ApiError> {
    info!(
        messages = request.messages.len(),
        tool_results = request.tool_results.len(),
        "tool result request received"
    );

    let mut messages = request.messages;
    messages.extend(request.tool_results);
    refresh_scratchpad(&mut messages, &request.scratchpad);

    let tools = if request.tools.is_empty() {
        state.registry.definitions()
    } else {
        request.tools
    };

    let response = state
        .provider
        .chat(&messages, Some(&tools), state.config.agent.max_tokens, 0.0)
        .await?;

    let message = if response.has_tool_calls() {
        Message::assistant_tool_calls(response.content, response.tool_calls)
    } else {
        Message::assistant(response.content.unwrap_or_default())
    };
    Ok(Json(ToolResultResponse { message }))
}

// ---------------------------------------------------------------------------
// GET /api/health
// ---------------------------------------------------------------------------

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "provider": state.provider.provider_name(),
        "model": state.provider.model(),
    }))
}

/// Bind and serve the gateway until the process is stopped.
pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = format!(
        "{}:{}",
        state.config.gateway.host, state.config.gateway.port
    );
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "gateway listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
