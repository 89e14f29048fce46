//! Scratchpad: the agent's append-only working memory, soft-bounded by
//! LLM-driven compaction.
//!
//! The pad is a plain string that grows as the run progresses (user prompt,
//! tool outcomes, final answer). Once it exceeds `max_chars`, the head is
//! summarized by the model while the most recent `tail_chars` characters are
//! kept verbatim, so recent tool results stay byte-exact in context.

use anyhow::Result;
use tracing::{debug, info};

use crate::errors::AgentError;
use crate::providers::base::LLMProvider;

use super::context::Message;

pub const DEFAULT_MAX_CHARS: usize = 2000;
pub const DEFAULT_TAIL_CHARS: usize = 1000;

const SUMMARY_MAX_TOKENS: u32 = 256;

/// Bounded working memory for one agent run.
#[derive(Debug, Clone)]
pub struct Scratchpad {
    content: String,
    max_chars: usize,
    tail_chars: usize,
}

impl Scratchpad {
    /// Create a scratchpad seeded with the given content.
    pub fn new(seed: String, max_chars: usize, tail_chars: usize) -> Self {
        Self {
            content: seed,
            max_chars,
            tail_chars,
        }
    }

    pub fn with_defaults(seed: String) -> Self {
        Self::new(seed, DEFAULT_MAX_CHARS, DEFAULT_TAIL_CHARS)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn len_chars(&self) -> usize {
        self.content.chars().count()
    }

    /// Append an entry, ensuring it ends with a newline.
    ///
    /// No size check happens here: appends always succeed and compaction is
    /// deferred to the next `compact_if_needed` call.
    pub fn append(&mut self, entry: &str) {
        self.content.push_str(entry);
        if !entry.ends_with('\n') {
            self.content.push('\n');
        }
    }

    /// Compact the pad when it exceeds the size threshold.
    ///
    /// The last `tail_chars` characters are kept verbatim (the split may land
    /// mid-word); everything before them is replaced with a model-written
    /// summary. A failed summarization call is fatal to the run.
    pub async fn compact_if_needed(&mut self, provider: &dyn LLMProvider) -> Result<()> {
        let total = self.len_chars();
        if total <= self.max_chars {
            return Ok(());
        }

        let split = total.saturating_sub(self.tail_chars);
        let boundary = self
            .content
            .char_indices()
            .nth(split)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len());
        let head = &self.content[..boundary];
        let tail = &self.content[boundary..];

        debug!(
            pad_chars = total,
            head_chars = split,
            "compacting scratchpad"
        );

        let summary = summarize(provider, head)
            .await
            .map_err(|e| AgentError::ScratchpadCompaction(e.to_string()))?;

        self.content = format!(
            "Summary of earlier history: {}\n\nRecent history:\n{}",
            summary, tail
        );
        info!(pad_chars = self.len_chars(), "scratchpad compacted");
        Ok(())
    }
}

/// Ask the model for a concise summary of the scratchpad head.
///
/// The priming sequence sets up the summarizer role, states the task, and
/// hands over the text to condense as a final user turn.
async fn summarize(provider: &dyn LLMProvider, head: &str) -> Result<String> {
    let messages = vec![
        Message::system(
            "You are a summarizer. Condense the following agent scratchpad \
             history into a short summary that preserves decisions made, \
             tools called, and their outcomes.",
        ),
        Message::user("Summarize the earlier history of this agent run."),
        Message::assistant("I'll summarize the earlier history now."),
        Message::user(head),
    ];

    let response = provider
        .chat(&messages, None, Some(SUMMARY_MAX_TOKENS), 0.0)
        .await?;
    Ok(response.content.unwrap_or_default())
}
