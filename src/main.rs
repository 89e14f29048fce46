//! dashbot - an LLM agent that manages a modular financial dashboard.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use dashbot::agent::runner::{AgentRunner, RunOptions, RunnerSettings};
use dashbot::config::loader::load_config;
use dashbot::providers::factory::create_provider;
use dashbot::server::{serve, AppState};
use dashbot::tools::dashboard::{register_dashboard_tools, InMemoryDashboard};
use dashbot::tools::registry::ToolRegistry;

#[derive(Parser)]
#[command(name = "dashbot", about = "Financial dashboard agent", version)]
struct Cli {
    /// Path to the config file (defaults to ~/.dashbot/config.json).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one agent turn against an in-memory dashboard and print the result.
    Run {
        /// The user prompt.
        prompt: String,
        /// Initial dashboard state as inline JSON.
        #[arg(long)]
        initial_state: Option<String>,
    },
    /// Start the HTTP gateway.
    Serve {
        /// Override the configured port.
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    match cli.command {
        Commands::Run {
            prompt,
            initial_state,
        } => {
            let provider = create_provider(&config.provider)?;

            let store = Arc::new(InMemoryDashboard::new());
            let mut registry = ToolRegistry::new();
            register_dashboard_tools(&mut registry, store)?;

            let settings = RunnerSettings {
                max_iterations: config.agent.max_iterations,
                max_tokens: config.agent.max_tokens,
                tool_timeout: std::time::Duration::from_millis(config.agent.tool_timeout_ms),
                scratchpad_max_chars: config.agent.scratchpad_max_chars,
                scratchpad_tail_chars: config.agent.scratchpad_tail_chars,
                ..Default::default()
            };
            let runner = AgentRunner::new(provider, Arc::new(registry), settings);

            let initial_state: Option<Value> = initial_state
                .map(|raw| serde_json::from_str(&raw))
                .transpose()
                .context("--initial-state must be valid JSON")?;
            let options = RunOptions { initial_state };

            let result = runner.run(&prompt, &[], &options).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.gateway.port = port;
            }
            let provider = create_provider(&config.provider)?;

            let store = Arc::new(InMemoryDashboard::new());
            let mut registry = ToolRegistry::new();
            register_dashboard_tools(&mut registry, store)?;

            let state = AppState {
                provider,
                registry: Arc::new(registry),
                config: Arc::new(config),
            };
            serve(state).await?;
        }
    }

    Ok(())
}
