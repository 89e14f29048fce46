//! Base trait for agent tools.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// A named, schema-described operation the model may request.
///
/// Handlers receive already-parsed JSON arguments and return a JSON value;
/// they may fail with any error. The dispatcher converts failures and
/// timeouts into error payloads the model can see — a tool must never be
/// able to abort the run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name used in function calls.
    fn name(&self) -> &str;

    /// Description of what the tool does.
    fn description(&self) -> &str;

    /// JSON Schema for tool parameters, including a `required` list.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given (validated) arguments.
    async fn call(&self, args: Map<String, Value>) -> Result<Value>;

    /// OpenAI function-definition schema for this tool.
    fn schema(&self) -> Value {
        json!({
            "type": "function",
            "function": {
                "name": self.name(),
                "description": self.description(),
                "parameters": self.parameters(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back"
        }

        fn parameters(&self) -> Value {
            json!({
                "type": "object",
                "properties": { "value": { "type": "string" } },
                "required": ["value"]
            })
        }

        async fn call(&self, args: Map<String, Value>) -> Result<Value> {
            Ok(args.get("value").cloned().unwrap_or(Value::Null))
        }
    }

    #[test]
    fn test_schema_shape() {
        let schema = EchoTool.schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "echo");
        assert_eq!(schema["function"]["parameters"]["required"][0], "value");
    }

    #[tokio::test]
    async fn test_call() {
        let mut args = Map::new();
        args.insert("value".to_string(), json!("hi"));
        let out = EchoTool.call(args).await.unwrap();
        assert_eq!(out, json!("hi"));
    }
}
