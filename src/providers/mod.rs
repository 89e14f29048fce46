//! LLM providers.

pub mod base;
pub mod factory;
pub mod openai;
