//! Conversation context: the ordered message list sent to the model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::base::ToolCall;

/// Name tag of the distinguished scratchpad message inside the context.
pub const SCRATCHPAD_NAME: &str = "scratchpad";

/// One turn in the LLM conversation, serialized wire-faithfully.
///
/// Invariant (provider-level contract): every `role == "tool"` message's
/// `tool_call_id` must match a `tool_calls[].id` emitted by a preceding
/// assistant message in the same context, or the chat call fails.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain("assistant", content)
    }

    /// Assistant message carrying tool-call requests. `content` may be empty
    /// when the model emitted calls without accompanying text.
    pub fn assistant_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            name: None,
            content,
            tool_calls,
            tool_call_id: None,
        }
    }

    /// Tool-role message answering the call with the given id.
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            name: None,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// The distinguished scratchpad mirror (role=system, name="scratchpad").
    pub fn scratchpad(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            name: Some(SCRATCHPAD_NAME.to_string()),
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    fn plain(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            name: None,
            content: Some(content.into()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    /// Whether this is the scratchpad mirror message.
    pub fn is_scratchpad(&self) -> bool {
        self.role == "system" && self.name.as_deref() == Some(SCRATCHPAD_NAME)
    }
}

/// One entry of caller-supplied conversation history.
///
/// The UI speaks in user/agent turns; `build_context` maps "agent" to the
/// wire role "assistant".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: HistoryRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Agent,
}

/// Build the initial conversation context for a run:
/// `[system, ...history, user prompt, scratchpad]`.
///
/// The context is exclusively owned by the run that built it; it grows
/// monotonically as iterations append assistant and tool messages.
pub fn build_context(
    system_prompt: &str,
    history: &[HistoryEntry],
    user_prompt: &str,
    scratchpad: &str,
) -> Vec<Message> {
    let mut messages = Vec::with_capacity(3 + history.len());
    messages.push(Message::system(system_prompt));
    for entry in history {
        messages.push(match entry.role {
            HistoryRole::User => Message::user(entry.content.clone()),
            HistoryRole::Agent => Message::assistant(entry.content.clone()),
        });
    }
    messages.push(Message::user(user_prompt));
    messages.push(Message::scratchpad(scratchpad));
    messages
}

/// Rewrite the scratchpad mirror's content in place.
///
/// Called before every LLM call so the model always sees the current pad.
pub fn refresh_scratchpad(messages: &mut [Message], scratchpad: &str) {
    if let Some(msg) = messages.iter_mut().find(|m| m.is_scratchpad()) {
        msg.content = Some(scratchpad.to_string());
    }
}

/// Seed scratchpad content for a new run.
///
/// An initial dashboard snapshot, when supplied, is serialized into the pad
/// so the model has situational context without an extra tool round-trip.
pub fn seed_scratchpad(user_prompt: &str, initial_state: Option<&Value>) -> String {
    let mut pad = format!("User: {}\n", user_prompt);
    if let Some(state) = initial_state {
        let pretty = serde_json::to_string_pretty(state).unwrap_or_else(|_| state.to_string());
        pad.push_str(&format!("Initial dashboard state: {}\n", pretty));
    }
    pad
}
