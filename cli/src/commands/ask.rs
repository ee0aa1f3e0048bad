//! Single question command

use crate::output;
use anyhow::Result;
use ecotoxfred_core::Agent;
use std::path::PathBuf;
use tracing::info;

/// Answer a single question and exit
pub async fn ask_command(
    question: String,
    config_loader: crate::config::CliConfigLoader,
    max_steps: Option<usize>,
    figures_dir: PathBuf,
) -> Result<()> {
    info!("Answering question: {}", question);

    let mut agent = super::build_agent(&config_loader, max_steps).await?;

    let spinner = output::spinner("EcoToxFred is thinking...");
    let execution = agent.execute_task(&question).await?;
    spinner.finish_and_clear();

    output::print_execution(&execution);
    output::save_artifacts(&figures_dir, &execution.artifacts).await?;

    if !execution.success {
        std::process::exit(1);
    }
    Ok(())
}
