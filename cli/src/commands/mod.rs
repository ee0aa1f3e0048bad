//! CLI command implementations

pub mod ask;
pub mod chat;
pub mod check_examples;
pub mod prompt;
pub mod tools;

pub use ask::ask_command;
pub use chat::chat_command;
pub use check_examples::check_examples_command;
pub use prompt::prompt_command;
pub use tools::tools_command;

use crate::config::CliConfigLoader;
use anyhow::{Context, Result};
use ecotoxfred_core::{AgentBuilder, AgentCore};
use ecotoxfred_core::prompt::PromptStore;

/// Load the configuration and wire up an agent
pub(crate) async fn build_agent(
    config_loader: &CliConfigLoader,
    max_steps: Option<usize>,
) -> Result<AgentCore> {
    let app_config = config_loader.load().await?;
    tracing::info!(model = %app_config.llm.model, graph = %app_config.graph.uri, "Configuration loaded");

    let mut builder = AgentBuilder::new(app_config);
    if let Some(steps) = max_steps {
        builder = builder.with_max_steps(steps);
    }
    builder.build().await.context("Failed to set up the agent")
}

/// Prompt store for commands that need no other configuration
pub(crate) fn prompt_store(config_loader: &CliConfigLoader) -> PromptStore {
    match config_loader.prompts_dir_override() {
        Some(dir) => PromptStore::new(dir),
        None => PromptStore::default(),
    }
}
