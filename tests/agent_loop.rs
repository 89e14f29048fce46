//! End-to-end agent loop scenarios against a scripted provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

use dashbot::agent::context::Message;
use dashbot::agent::runner::{AgentRunner, RunOptions, RunnerSettings, ThoughtKind};
use dashbot::errors::AgentError;
use dashbot::providers::base::{LLMProvider, LLMResponse, ToolCall};
use dashbot::tools::base::Tool;
use dashbot::tools::dashboard::{register_dashboard_tools, DashboardStore, InMemoryDashboard};
use dashbot::tools::registry::ToolRegistry;

/// Provider that replays a script of responses and records every context it
/// was called with, so scratchpad mirroring is observable.
#[derive(Debug)]
struct ScriptedProvider {
    script: Mutex<VecDeque<LLMResponse>>,
    contexts: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<LLMResponse>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            contexts: Mutex::new(Vec::new()),
        })
    }

    fn contexts(&self) -> Vec<Vec<Message>> {
        self.contexts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat(
        &self,
        messages: &[Message],
        _tools: Option<&[Value]>,
        _max_tokens: Option<u32>,
        _temperature: f64,
    ) -> Result<LLMResponse> {
        self.contexts.lock().unwrap().push(messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("script exhausted"))
    }

    fn model(&self) -> &str {
        "scripted"
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

fn stop(text: &str) -> LLMResponse {
    LLMResponse {
        content: Some(text.to_string()),
        tool_calls: Vec::new(),
        finish_reason: "stop".to_string(),
    }
}

fn tool_calls(content: Option<&str>, calls: Vec<ToolCall>) -> LLMResponse {
    LLMResponse {
        content: content.map(|c| c.to_string()),
        tool_calls: calls,
        finish_reason: "tool_calls".to_string(),
    }
}

fn dashboard_runner(
    provider: Arc<ScriptedProvider>,
) -> (AgentRunner, Arc<InMemoryDashboard>) {
    let store = Arc::new(InMemoryDashboard::new());
    let mut registry = ToolRegistry::new();
    register_dashboard_tools(&mut registry, store.clone()).unwrap();
    let runner = AgentRunner::new(provider, Arc::new(registry), RunnerSettings::default());
    (runner, store)
}

fn scratchpad_of(context: &[Message]) -> String {
    context
        .iter()
        .find(|m| m.is_scratchpad())
        .and_then(|m| m.content.clone())
        .unwrap_or_default()
}

#[tokio::test]
async fn simple_question_yields_single_final_thought() {
    let provider = ScriptedProvider::new(vec![stop("Your net worth module shows $10k.")]);
    let (runner, _) = dashboard_runner(provider.clone());

    let result = runner
        .run("what does my dashboard show?", &[], &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(result.response, "Your net worth module shows $10k.");
    assert!(result.is_display);
    assert_eq!(result.thoughts.len(), 1);
    assert_eq!(result.thoughts[0].kind, ThoughtKind::Final);

    // Exactly one chat call, seeded scratchpad visible to the model.
    let contexts = provider.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(
        scratchpad_of(&contexts[0]),
        "User: what does my dashboard show?\n"
    );
}

#[tokio::test]
async fn tool_round_trip_mutates_store_and_mirrors_scratchpad() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(
            Some("Plan: add the summary module."),
            vec![ToolCall::function(
                "call_1",
                "addModule",
                r#"{"moduleType":"netWorthSummary","config":{}}"#,
            )],
        ),
        stop("Added a net worth summary."),
    ]);
    let (runner, store) = dashboard_runner(provider.clone());

    let result = runner
        .run("add a net worth summary", &[], &RunOptions::default())
        .await
        .unwrap();

    assert_eq!(result.response, "Added a net worth summary.");
    assert_eq!(result.thoughts.len(), 2);
    assert_eq!(result.thoughts[0].kind, ThoughtKind::Planning);
    assert_eq!(result.thoughts[0].content, "Plan: add the summary module.");
    assert_eq!(result.thoughts[1].kind, ThoughtKind::Final);

    // The tool really ran.
    let state = store.get_state();
    assert_eq!(state["modules"][0]["moduleType"], "netWorthSummary");

    // Second call's context: assistant tool-call message, then the tool
    // result, and the scratchpad records the call with the model's key order.
    let contexts = provider.contexts();
    assert_eq!(contexts.len(), 2);
    let second = &contexts[1];
    let tool_msg = second.iter().find(|m| m.role == "tool").unwrap();
    assert_eq!(tool_msg.tool_call_id.as_deref(), Some("call_1"));
    assert!(tool_msg.content.as_deref().unwrap().contains("success"));

    let pad = scratchpad_of(second);
    assert!(pad.contains(
        "Tool addModule called with args {\"moduleType\":\"netWorthSummary\",\"config\":{}}."
    ));
    assert!(pad.contains("Result: {\"status\":\"success\",\"moduleId\":\"m1\"}"));
}

#[tokio::test]
async fn unknown_tool_feeds_error_back_and_run_continues() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(
            Some("Plan: use a tool that does not exist."),
            vec![ToolCall::function("call_1", "exportPdf", r#"{}"#)],
        ),
        stop("I cannot export PDFs."),
    ]);
    let (runner, _) = dashboard_runner(provider.clone());

    let result = runner
        .run("export my dashboard", &[], &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(result.response, "I cannot export PDFs.");

    let contexts = provider.contexts();
    let tool_msg = contexts[1].iter().find(|m| m.role == "tool").unwrap();
    assert!(tool_msg
        .content
        .as_deref()
        .unwrap()
        .contains("not implemented"));
}

#[tokio::test]
async fn unexpected_finish_reason_is_fatal() {
    let provider = ScriptedProvider::new(vec![LLMResponse {
        content: Some("truncat".to_string()),
        tool_calls: Vec::new(),
        finish_reason: "length".to_string(),
    }]);
    let (runner, _) = dashboard_runner(provider);

    let err = runner
        .run("hi", &[], &RunOptions::default())
        .await
        .unwrap_err();
    match err.downcast_ref::<AgentError>() {
        Some(AgentError::UnexpectedAgentExit(reason)) => assert_eq!(reason, "length"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn three_iterations_classify_planning_reasoning_final() {
    let provider = ScriptedProvider::new(vec![
        tool_calls(
            Some("Plan: add then configure."),
            vec![ToolCall::function(
                "call_1",
                "addModule",
                r#"{"moduleType":"portfolioChart","config":{}}"#,
            )],
        ),
        tool_calls(
            None, // no explanation on the second round
            vec![ToolCall::function(
                "call_2",
                "updateModuleConfig",
                r#"{"moduleId":"m1","newConfig":{"timeframe":"1Y"}}"#,
            )],
        ),
        stop("Chart added and set to one year."),
    ]);
    let (runner, store) = dashboard_runner(provider);

    let result = runner
        .run("add a 1Y portfolio chart", &[], &RunOptions::default())
        .await
        .unwrap();

    let kinds: Vec<ThoughtKind> = result.thoughts.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ThoughtKind::Planning,
            ThoughtKind::Reasoning,
            ThoughtKind::Final
        ]
    );
    assert_eq!(result.thoughts[1].content, "(No explanation provided)");

    let state = store.get_state();
    assert_eq!(state["modules"][0]["config"]["timeframe"], "1Y");
}

#[tokio::test]
async fn iteration_limit_is_fatal() {
    // The model keeps calling tools forever; the loop must give up.
    let looped: Vec<LLMResponse> = (0..20)
        .map(|i| {
            tool_calls(
                Some("again"),
                vec![ToolCall::function(
                    format!("call_{}", i),
                    "addModule",
                    r#"{"moduleType":"expensesTable","config":{}}"#,
                )],
            )
        })
        .collect();
    let provider = ScriptedProvider::new(looped);

    let store = Arc::new(InMemoryDashboard::new());
    let mut registry = ToolRegistry::new();
    register_dashboard_tools(&mut registry, store).unwrap();
    let settings = RunnerSettings {
        max_iterations: 3,
        // Large threshold keeps compaction out of this scenario.
        scratchpad_max_chars: 100_000,
        ..Default::default()
    };
    let runner = AgentRunner::new(provider, Arc::new(registry), settings);

    let err = runner
        .run("loop forever", &[], &RunOptions::default())
        .await
        .unwrap_err();
    match err.downcast_ref::<AgentError>() {
        Some(AgentError::IterationLimitExceeded(n)) => assert_eq!(*n, 3),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn initial_state_is_seeded_into_scratchpad() {
    let provider = ScriptedProvider::new(vec![stop("You have one module.")]);
    let (runner, _) = dashboard_runner(provider.clone());

    let options = RunOptions {
        initial_state: Some(json!({
            "modules": [{"id": "m1", "moduleType": "expensesTable", "config": {}, "status": "loaded"}]
        })),
    };
    runner
        .run("what do I have?", &[], &options)
        .await
        .unwrap();

    let pad = scratchpad_of(&provider.contexts()[0]);
    assert!(pad.starts_with("User: what do I have?\n"));
    assert!(pad.contains("Initial dashboard state:"));
    assert!(pad.contains("expensesTable"));
}

#[tokio::test]
async fn slow_tool_times_out_and_run_continues() {
    struct NapTool;

    #[async_trait]
    impl Tool for NapTool {
        fn name(&self) -> &str {
            "nap"
        }

        fn description(&self) -> &str {
            "sleeps"
        }

        fn parameters(&self) -> Value {
            json!({"type": "object", "properties": {}, "required": []})
        }

        async fn call(&self, _args: Map<String, Value>) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!({"status": "success"}))
        }
    }

    let provider = ScriptedProvider::new(vec![
        tool_calls(
            Some("Plan: nap."),
            vec![ToolCall::function("call_1", "nap", r#"{}"#)],
        ),
        stop("The tool timed out."),
    ]);

    let mut registry = ToolRegistry::new();
    registry.register(Box::new(NapTool)).unwrap();
    let settings = RunnerSettings {
        tool_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let runner = AgentRunner::new(provider.clone(), Arc::new(registry), settings);

    let result = runner
        .run("take a nap", &[], &RunOptions::default())
        .await
        .unwrap();
    assert_eq!(result.response, "The tool timed out.");

    let tool_msg = provider.contexts()[1]
        .iter()
        .find(|m| m.role == "tool")
        .cloned()
        .unwrap();
    assert!(tool_msg
        .content
        .as_deref()
        .unwrap()
        .contains("Tool execution timed out"));
}
