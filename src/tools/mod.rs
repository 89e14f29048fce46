//! Tool system: trait, registry, and the dashboard tool set.

pub mod base;
pub mod dashboard;
pub mod registry;
