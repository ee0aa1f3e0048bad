//! # EcoToxFred CLI
//!
//! Command-line interface for EcoToxFred, a conversational assistant over a
//! graph of chemical monitoring data in European surface waters.
//!
//! ## Usage
//!
//! - `ecotoxfred` - Start an interactive chat
//! - `ecotoxfred ask "question"` - Answer a single question
//! - `ecotoxfred tools` - Show available tools
//! - `ecotoxfred prompt general` - Print a composed prompt
//! - `ecotoxfred check-examples` - Run the few-shot examples against the graph

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ecotoxfred_core::PromptKind;
use std::path::PathBuf;

mod commands;
mod config;
mod output;

use commands::{ask_command, check_examples_command, chat_command, prompt_command, tools_command};
use config::CliConfigLoader;

/// ecotoxfred - Ask questions about chemicals in European surface waters
#[derive(Parser)]
#[command(name = "ecotoxfred")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Chat with a knowledge graph of chemical monitoring data in European surface waters")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file or directory path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key override
    #[arg(long)]
    api_key: Option<String>,

    /// Base URL override
    #[arg(long)]
    base_url: Option<String>,

    /// Model name override
    #[arg(long)]
    model: Option<String>,

    /// Directory with prompt definitions
    #[arg(long, env = "ECOTOXFRED_PROMPTS_DIR")]
    prompts_dir: Option<PathBuf>,

    /// Directory where charts are written
    #[arg(long, default_value = "figures")]
    figures_dir: PathBuf,

    /// Maximum number of model round trips per question
    #[arg(long)]
    max_steps: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a single question
    Ask {
        /// The question to answer
        question: String,
    },

    /// Show available tools
    Tools,

    /// Print a composed prompt
    Prompt {
        #[arg(value_enum)]
        kind: PromptArg,
    },

    /// Run every few-shot example query against the graph database
    CheckExamples,
}

#[derive(Clone, Copy, ValueEnum)]
enum PromptArg {
    General,
    Map,
    Agent,
}

impl From<PromptArg> for PromptKind {
    fn from(arg: PromptArg) -> Self {
        match arg {
            PromptArg::General => PromptKind::CypherGeneral,
            PromptArg::Map => PromptKind::CypherMap,
            PromptArg::Agent => PromptKind::Agent,
        }
    }
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(api_key) = &cli.api_key {
        loader = loader.with_api_key_override(api_key.clone());
    }

    if let Some(base_url) = &cli.base_url {
        loader = loader.with_base_url_override(base_url.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(prompts_dir) = &cli.prompts_dir {
        loader = loader.with_prompts_dir_override(prompts_dir.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let config_loader = build_config_loader(&cli);

    match cli.command {
        Some(Commands::Ask { question }) => {
            ask_command(question, config_loader, cli.max_steps, cli.figures_dir).await
        }
        Some(Commands::Tools) => tools_command().await,
        Some(Commands::Prompt { kind }) => prompt_command(kind.into(), config_loader).await,
        Some(Commands::CheckExamples) => check_examples_command(config_loader).await,
        None => chat_command(config_loader, cli.max_steps, cli.figures_dir).await,
    }
}
