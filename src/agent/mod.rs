//! Agent core: context building, working memory, tool dispatch, and the
//! iteration loop.

pub mod context;
pub mod dispatch;
pub mod prompt;
pub mod runner;
pub mod scratchpad;
