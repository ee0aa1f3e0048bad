//! Runs the bundled few-shot examples against the graph database

use anyhow::{bail, Context, Result};
use colored::Colorize;
use ecotoxfred_core::graph::{GraphStore, Neo4jHttpStore};
use ecotoxfred_core::PromptKind;

/// Run every example query of every collection and report failures
pub async fn check_examples_command(config_loader: crate::config::CliConfigLoader) -> Result<()> {
    let graph_config = config_loader.load_graph().await?;
    let store = Neo4jHttpStore::connect(graph_config)
        .await
        .context("Graph database is not usable")?;
    let prompts = super::prompt_store(&config_loader);

    let mut checked = 0;
    let mut failed = 0;

    for kind in PromptKind::all() {
        let Some(recipe) = kind.recipe() else {
            continue;
        };
        let collection = prompts
            .load_examples(recipe.examples)
            .await
            .with_context(|| format!("Failed to load examples '{}'", recipe.examples))?;

        println!("{} ({} examples)", collection.name().bold(), collection.len());

        for entry in collection.entries() {
            checked += 1;
            match store.run(&entry.query_text, 1).await {
                Ok(_) => println!("  {} {}", "ok".green(), entry.description),
                Err(e) if e.is_recoverable() => {
                    failed += 1;
                    println!("  {} {}\n      {}", "FAILED".red(), entry.description, e);
                }
                Err(e) => return Err(e).context("Graph database is not usable"),
            }
        }
    }

    println!();
    if failed > 0 {
        bail!("{} of {} example queries failed", failed, checked);
    }
    println!("{}", format!("All {} example queries ran", checked).green());
    Ok(())
}
