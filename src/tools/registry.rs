//! Tool registry: the model's catalog of callable operations.

use serde_json::Value;
use thiserror::Error;

use super::base::Tool;

/// Registering a name twice is a hard error.
///
/// The upstream behavior was last-registration-wins; that silently masks
/// wiring bugs when two call sites disagree about a tool, so registration
/// conflicts fail loudly instead.
#[derive(Debug, Error)]
#[error("Tool '{0}' is already registered")]
pub struct DuplicateToolError(pub String);

/// Registry for agent tools.
///
/// Backed by a `Vec` so `definitions()` presents tools to the model in a
/// stable, deterministic order (registration order). Read-only during a run;
/// safe to share behind an `Arc` across concurrent runs.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, tool: Box<dyn Tool>) -> Result<(), DuplicateToolError> {
        if self.resolve(tool.name()).is_some() {
            return Err(DuplicateToolError(tool.name().to_string()));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Look up a tool by name.
    ///
    /// Absence is not an error here: the dispatcher converts a missing tool
    /// into an error tool-result so the conversation can continue.
    pub fn resolve(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// All tool definitions in OpenAI format, in registration order.
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct MockTool {
        tool_name: String,
    }

    impl MockTool {
        fn new(name: &str) -> Self {
            Self {
                tool_name: name.to_string(),
            }
        }
    }

    #[async_trait]
    impl Tool for MockTool {
        fn name(&self) -> &str {
            &self.tool_name
        }

        fn description(&self) -> &str {
            "A mock tool for testing"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "value": { "type": "string" } },
                "required": ["value"]
            })
        }

        async fn call(&self, args: Map<String, Value>) -> Result<Value> {
            let value = args.get("value").and_then(|v| v.as_str()).unwrap_or("");
            Ok(json!(format!("{}:{}", self.tool_name, value)))
        }
    }

    #[test]
    fn test_new_registry_is_empty() {
        let registry = ToolRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(MockTool::new("alpha"))).unwrap();

        assert!(registry.resolve("alpha").is_some());
        assert!(registry.resolve("beta").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(MockTool::new("dup"))).unwrap();

        let err = registry
            .register(Box::new(MockTool::new("dup")))
            .unwrap_err();
        assert_eq!(err.0, "dup");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_definitions_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(Box::new(MockTool::new(name))).unwrap();
        }

        let names: Vec<String> = registry
            .definitions()
            .iter()
            .map(|d| d["function"]["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_definitions_openai_format() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(MockTool::new("def"))).unwrap();

        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0]["type"], "function");
        assert_eq!(defs[0]["function"]["name"], "def");
    }
}
