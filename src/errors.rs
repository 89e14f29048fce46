//! Domain error types for dashbot.
//!
//! Typed errors at module boundaries replace string-encoded errors and
//! enable structured error handling via pattern matching.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Agent run errors
// ---------------------------------------------------------------------------

/// Fatal errors raised by the agent loop.
///
/// Embedded in `anyhow::Error` so `AgentRunner::run` keeps its
/// `anyhow::Result<AgentResult>` signature while callers can downcast:
/// `e.downcast_ref::<AgentError>()`.
///
/// Tool-level failures are deliberately absent: a tool that throws, times
/// out, receives bad arguments, or does not exist is converted into an
/// error-payload tool result and fed back to the model — the run continues.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Scratchpad compaction failed: {0}")]
    ScratchpadCompaction(String),

    #[error("Agent exited with unexpected finish reason: {0}")]
    UnexpectedAgentExit(String),

    #[error("Agent exceeded {0} iterations without producing a final response")]
    IterationLimitExceeded(u32),
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors from LLM provider operations.
///
/// All variants are fatal to the current run — there is no retry at this
/// layer. Transport-level timeouts are left to reqwest's own defaults.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Failed to read response body: {0}")]
    ResponseReadError(String),

    #[error("Failed to parse response JSON: {0}")]
    JsonParseError(String),

    #[error("Authentication failed (status {status}): {message}")]
    AuthError { status: u16, message: String },

    #[error("Server error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Empty response: no choices returned")]
    EmptyResponse,
}
