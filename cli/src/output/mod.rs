//! Terminal output: spinner, answers and chart files

use anyhow::{Context, Result};
use colored::Colorize;
use ecotoxfred_core::{AgentExecution, Figure};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Spinner shown while a turn runs
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.blue} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// What the user sees instead of a raw error
pub fn apology() -> &'static str {
    "Sorry, I could not answer that. Please try rephrasing your question."
}

/// Print the answer of a turn. Failure details go to the log only.
pub fn print_execution(execution: &AgentExecution) {
    if execution.success {
        println!("\n{}\n", execution.final_result);
    } else {
        tracing::warn!(
            steps = execution.steps_executed,
            detail = %execution.final_result,
            "Turn ended without an answer"
        );
        println!("\n{}\n", apology().red());
    }
    tracing::debug!(
        steps = execution.steps_executed,
        duration_ms = execution.duration_ms,
        "Turn finished"
    );
}

/// Write each chart as `<dir>/<uuid>.json` and return the paths
pub async fn save_artifacts(dir: &Path, figures: &[Figure]) -> Result<Vec<PathBuf>> {
    if figures.is_empty() {
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create figures directory: {}", dir.display()))?;

    let mut paths = Vec::with_capacity(figures.len());
    for figure in figures {
        let path = dir.join(format!("{}.json", uuid::Uuid::new_v4()));
        let content = serde_json::to_string_pretty(figure)?;
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write figure: {}", path.display()))?;
        println!(
            "{} {} ({} sites)",
            "Map saved to".dimmed(),
            path.display(),
            figure.point_count()
        );
        paths.push(path);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_artifacts_writes_one_file_per_figure() {
        let dir = TempDir::new().unwrap();
        let figures_dir = dir.path().join("figures");
        let figure = Figure {
            data: vec![json!({"type": "scattergeo", "lat": [50.0], "lon": [7.0]})],
            layout: json!({"geo": {"scope": "europe"}}),
        };

        let paths = save_artifacts(&figures_dir, &[figure.clone(), figure.clone()])
            .await
            .unwrap();

        assert_eq!(paths.len(), 2);
        let restored: Figure =
            serde_json::from_str(&std::fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(restored, figure);
    }

    #[tokio::test]
    async fn test_no_figures_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let figures_dir = dir.path().join("figures");
        assert!(save_artifacts(&figures_dir, &[]).await.unwrap().is_empty());
        assert!(!figures_dir.exists());
    }
}
