//! Composed prompt printing command

use anyhow::{Context, Result};
use ecotoxfred_core::PromptKind;

/// Print a composed prompt. Query prompts keep their `{question}` placeholder.
pub async fn prompt_command(
    kind: PromptKind,
    config_loader: crate::config::CliConfigLoader,
) -> Result<()> {
    let store = super::prompt_store(&config_loader);
    let prompt = store
        .get(kind)
        .await
        .with_context(|| format!("Failed to compose the {} prompt", kind))?;

    tracing::debug!(
        prompt = %kind,
        parameters = ?prompt.parameters(),
        "Composed prompt"
    );
    println!("{}", prompt.text());
    Ok(())
}
