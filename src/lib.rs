//! dashbot library — an LLM agent runner for a modular financial dashboard.
//!
//! The agent plans, calls dashboard tools, and answers, keeping a bounded
//! scratchpad as working memory. Embeddable in-process via
//! [`agent::runner::AgentRunner`] or behind the HTTP gateway in [`server`].

pub mod agent;
pub mod config;
pub mod errors;
pub mod providers;
pub mod server;
pub mod tools;
