//! CLI configuration loader for EcoToxFred
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Current working directory: ./ecotoxfred.json or ./.ecotoxfred/config.json
//! 3. User config: <config dir>/ecotoxfred/config.json
//! 4. Environment variables only (no files)
//!
//! Values a file leaves out are taken from the environment.

use anyhow::{anyhow, Context, Result};
use ecotoxfred_core::config::QueryToolLimits;
use ecotoxfred_core::{GraphStoreConfig, ModelParams, Protocol, ResolvedAppConfig, ResolvedLlmConfig};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DEFAULT_MODEL: &str = "gpt-4o";
const CONFIG_FILE_NAME: &str = "ecotoxfred.json";
const CONFIG_DIR_NAME: &str = ".ecotoxfred";
const APP_DIR_NAME: &str = "ecotoxfred";

/// Raw configuration file format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(default)]
    pub llm: RawLlmConfig,
    #[serde(default)]
    pub graph: RawGraphConfig,
    /// Directory with prompt definitions
    pub prompts_dir: Option<PathBuf>,
    pub limits: Option<QueryToolLimits>,
    pub data_source_link: Option<String>,
}

/// Model section of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawLlmConfig {
    /// Protocol to use, `openai` unless set
    pub protocol: Option<String>,
    /// API key (can be "env:VAR_NAME" for environment variable)
    pub api_key: Option<String>,
    /// Base URL (optional, uses protocol default if not specified)
    pub base_url: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Model parameters (optional)
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers (optional)
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// Graph database section of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGraphConfig {
    pub uri: Option<String>,
    pub username: Option<String>,
    /// Password (can be "env:VAR_NAME" for environment variable)
    pub password: Option<String>,
    pub database: Option<String>,
}

/// CLI configuration loader
#[derive(Default)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Flag overrides
    api_key_override: Option<String>,
    base_url_override: Option<String>,
    model_override: Option<String>,
    prompts_dir_override: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set API key override
    pub fn with_api_key_override(mut self, api_key: String) -> Self {
        self.api_key_override = Some(api_key);
        self
    }

    /// Set base URL override
    pub fn with_base_url_override(mut self, base_url: String) -> Self {
        self.base_url_override = Some(base_url);
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set prompt directory override
    pub fn with_prompts_dir_override(mut self, path: PathBuf) -> Self {
        self.prompts_dir_override = Some(path);
        self
    }

    /// Prompt directory from flags alone, for commands that need nothing else
    pub fn prompts_dir_override(&self) -> Option<&Path> {
        self.prompts_dir_override.as_deref()
    }

    /// Load and resolve the full application configuration
    pub async fn load(&self) -> Result<ResolvedAppConfig> {
        let config = self.load_raw().await?;

        let llm = self.resolve_llm(&config.llm)?;
        let graph = resolve_graph(&config.graph)?;

        let mut resolved = ResolvedAppConfig::new(llm, graph);
        resolved.prompts_dir = self.prompts_dir_override.clone().or(config.prompts_dir);
        if let Some(limits) = config.limits {
            resolved.limits = limits;
        }
        if let Some(link) = config.data_source_link {
            resolved.data_source_link = link;
        }

        resolved
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

        Ok(resolved)
    }

    /// Load only the graph database settings
    pub async fn load_graph(&self) -> Result<GraphStoreConfig> {
        let config = self.load_raw().await?;
        let graph = resolve_graph(&config.graph)?;
        graph
            .validate()
            .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;
        Ok(graph)
    }

    async fn load_raw(&self) -> Result<RawConfig> {
        if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })
        } else {
            self.search_and_load().await
        }
    }

    /// Search for config in priority order
    async fn search_and_load(&self) -> Result<RawConfig> {
        for candidate in self.candidate_files()? {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Loading configuration");
                return self.load_file(&candidate).await;
            }
        }

        tracing::debug!("No configuration file found, using environment variables");
        Ok(RawConfig::default())
    }

    fn candidate_files(&self) -> Result<Vec<PathBuf>> {
        let cwd = std::env::current_dir()?;
        let mut candidates = vec![
            cwd.join(CONFIG_FILE_NAME),
            cwd.join(CONFIG_DIR_NAME).join("config.json"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(APP_DIR_NAME).join("config.json"));
        }
        Ok(candidates)
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<RawConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file
    async fn load_file(&self, path: &Path) -> Result<RawConfig> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn resolve_llm(&self, config: &RawLlmConfig) -> Result<ResolvedLlmConfig> {
        let protocol = match config.protocol.as_deref().unwrap_or("openai") {
            "openai" | "openai_compat" => Protocol::OpenAICompat,
            "azure_openai" => Protocol::AzureOpenAI,
            other => return Err(anyhow!("Unsupported protocol: {}", other)),
        };

        let api_key = match self.api_key_override.clone().or_else(|| config.api_key.clone()) {
            Some(value) => resolve_secret(&value)?,
            None => env_var("OPENAI_API_KEY").ok_or_else(|| {
                anyhow!(
                    "No API key found. Please create an {} file or set OPENAI_API_KEY",
                    CONFIG_FILE_NAME
                )
            })?,
        };

        let base_url = self
            .base_url_override
            .clone()
            .or_else(|| config.base_url.clone())
            .or_else(|| env_var("OPENAI_BASE_URL"))
            .or_else(|| protocol.default_base_url().map(str::to_string))
            .ok_or_else(|| anyhow!("Protocol '{}' needs a base URL", protocol.as_str()))?;

        let model = self
            .model_override
            .clone()
            .or_else(|| config.model.clone())
            .or_else(|| env_var("OPENAI_MODEL"))
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let mut resolved = ResolvedLlmConfig::new(protocol, base_url, api_key, model)
            .with_params(config.params.clone());
        for (key, value) in &config.headers {
            resolved = resolved.with_header(key.clone(), value.clone());
        }
        Ok(resolved)
    }
}

fn resolve_graph(config: &RawGraphConfig) -> Result<GraphStoreConfig> {
    let uri = config
        .uri
        .clone()
        .or_else(|| env_var("NEO4J_URI"))
        .ok_or_else(|| anyhow!("No graph database configured. Set graph.uri or NEO4J_URI"))?;
    let username = config
        .username
        .clone()
        .or_else(|| env_var("NEO4J_USERNAME"))
        .ok_or_else(|| anyhow!("No graph database user. Set graph.username or NEO4J_USERNAME"))?;
    let password = match &config.password {
        Some(value) => resolve_secret(value)?,
        None => env_var("NEO4J_PASSWORD").ok_or_else(|| {
            anyhow!("No graph database password. Set graph.password or NEO4J_PASSWORD")
        })?,
    };

    let mut graph = GraphStoreConfig::new(uri, username, password);
    if let Some(database) = config.database.clone().or_else(|| env_var("NEO4J_DATABASE")) {
        graph = graph.with_database(database);
    }
    Ok(graph)
}

/// Resolve `env:VAR` values from the environment
fn resolve_secret(value: &str) -> Result<String> {
    match value.strip_prefix("env:") {
        Some(var_name) => std::env::var(var_name)
            .with_context(|| format!("Environment variable not found: {}", var_name)),
        None => Ok(value.to_string()),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const FULL_CONFIG: &str = r#"{
        "llm": {"api_key": "sk-test", "model": "gpt-4o-mini"},
        "graph": {"uri": "http://localhost:7474", "username": "neo4j", "password": "secret"},
        "limits": {"max_rows_shown": 3, "search_row_limit": 100, "map_row_limit": 500, "generation_temperature": 0.0}
    }"#;

    #[tokio::test]
    async fn test_load_from_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, FULL_CONFIG).unwrap();

        let config = CliConfigLoader::new()
            .with_config_override(path)
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.graph.database, "neo4j");
        assert_eq!(config.limits.max_rows_shown, 3);
        assert!(config.prompts_dir.is_none());
    }

    #[tokio::test]
    async fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.json"), FULL_CONFIG).unwrap();

        let config = CliConfigLoader::new()
            .with_config_override(dir.path().to_path_buf())
            .with_model_override("gpt-4.1".to_string())
            .with_base_url_override("http://localhost:8080/v1".to_string())
            .with_prompts_dir_override(PathBuf::from("/tmp/prompts"))
            .load()
            .await
            .unwrap();

        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.base_url, "http://localhost:8080/v1");
        assert_eq!(config.prompts_dir, Some(PathBuf::from("/tmp/prompts")));
    }

    #[tokio::test]
    async fn test_missing_override_path_fails() {
        let err = CliConfigLoader::new()
            .with_config_override(PathBuf::from("/nonexistent/ecotoxfred.json"))
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("override path"));
    }

    #[test]
    fn test_unsupported_protocol() {
        let raw = RawLlmConfig {
            protocol: Some("carrier_pigeon".to_string()),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let err = CliConfigLoader::new().resolve_llm(&raw).unwrap_err();
        assert!(err.to_string().contains("carrier_pigeon"));
    }

    #[test]
    fn test_plain_secret_is_kept() {
        assert_eq!(resolve_secret("secret").unwrap(), "secret");
        assert!(resolve_secret("env:ECOTOXFRED_TEST_SURELY_UNSET").is_err());
    }
}
