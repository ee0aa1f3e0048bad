//! Interactive chat command

use crate::output;
use anyhow::Result;
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input};
use ecotoxfred_core::Agent;
use std::path::PathBuf;

const GREETING: &str = "Hi, I'm EcoToxFred!  How can I help you?";

const EXAMPLE_QUESTIONS: [&str; 3] = [
    "What is Diuron and where has it been measured?",
    "For Diuron, can you provide the name of the sampling site and the measurement time point as a list?",
    "Show the sum of toxic units for algae since 2010 on the European map.",
];

/// Chat until the user types `exit`
pub async fn chat_command(
    config_loader: crate::config::CliConfigLoader,
    max_steps: Option<usize>,
    figures_dir: PathBuf,
) -> Result<()> {
    let mut agent = super::build_agent(&config_loader, max_steps).await?;
    let theme = ColorfulTheme::default();

    println!("{}\n", GREETING.bold());
    println!("{}", "Example questions:".dimmed());
    for question in EXAMPLE_QUESTIONS {
        println!("  {} {}", "•".dimmed(), question.dimmed());
    }
    println!(
        "{}\n",
        "Type 'reset' to start over or 'exit' to quit.".dimmed()
    );

    loop {
        let input: String = Input::with_theme(&theme)
            .with_prompt("You")
            .interact_text()?;
        let input = input.trim();

        match input {
            "" => continue,
            "exit" | "quit" => break,
            "reset" => {
                agent.reset();
                println!("{}\n", GREETING.bold());
                continue;
            }
            _ => {}
        }

        let spinner = output::spinner("EcoToxFred is thinking...");
        let execution = agent.execute_task(input).await;
        spinner.finish_and_clear();

        match execution {
            Ok(execution) => {
                output::print_execution(&execution);
                output::save_artifacts(&figures_dir, &execution.artifacts).await?;
            }
            Err(e) => {
                tracing::error!(error = %e, "Turn failed");
                println!("{}", output::apology().red());
            }
        }
    }

    Ok(())
}
