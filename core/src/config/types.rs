//! Configuration types for EcoToxFred core
//!
//! Core only accepts fully resolved, validated configuration.
//! All discovery, loading, and merging happens in CLI layer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Public dataset the answers are based on
pub const DEFAULT_DATA_SOURCE_LINK: &str = "https://zenodo.org/records/14616124";

/// Supported LLM protocols
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// OpenAI-compatible API (includes OpenAI, many proxies, local models)
    #[serde(rename = "openai_compat")]
    OpenAICompat,
    /// Azure OpenAI API, served through the same client
    #[serde(rename = "azure_openai")]
    AzureOpenAI,
}

impl Protocol {
    /// Get the protocol name as a string
    pub fn as_str(&self) -> &str {
        match self {
            Protocol::OpenAICompat => "openai_compat",
            Protocol::AzureOpenAI => "azure_openai",
        }
    }

    /// Get the default base URL for this protocol
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            Protocol::OpenAICompat => Some("https://api.openai.com/v1"),
            Protocol::AzureOpenAI => None, // Requires custom endpoint
        }
    }
}

/// Model parameters for LLM requests
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelParams {
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 to 2.0)
    pub temperature: Option<f32>,
    /// Top-p sampling parameter
    pub top_p: Option<f32>,
    /// Stop sequences
    pub stop_sequences: Option<Vec<String>>,
}

/// A fully resolved LLM configuration ready for use by core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedLlmConfig {
    /// The protocol to use
    pub protocol: Protocol,
    /// Base URL for the API
    pub base_url: String,
    /// API key for authentication
    pub api_key: String,
    /// Model name/identifier
    pub model: String,
    /// Model parameters
    #[serde(default)]
    pub params: ModelParams,
    /// Additional headers for requests
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl ResolvedLlmConfig {
    /// Create a new resolved LLM config
    pub fn new(protocol: Protocol, base_url: String, api_key: String, model: String) -> Self {
        Self {
            protocol,
            base_url,
            api_key,
            model,
            params: ModelParams::default(),
            headers: HashMap::new(),
        }
    }

    /// Set model parameters
    pub fn with_params(mut self, params: ModelParams) -> Self {
        self.params = params;
        self
    }

    /// Add a header
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.headers.insert(key, value);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API key cannot be empty".to_string());
        }

        if self.model.is_empty() {
            return Err("Model name cannot be empty".to_string());
        }

        validate_http_url("Base URL", &self.base_url)?;

        if let Some(temp) = self.params.temperature {
            if !(0.0..=2.0).contains(&temp) {
                return Err("Temperature must be between 0.0 and 2.0".to_string());
            }
        }

        if let Some(top_p) = self.params.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err("Top-p must be between 0.0 and 1.0".to_string());
            }
        }

        Ok(())
    }
}

/// Connection settings for the Neo4j HTTP endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStoreConfig {
    /// Base URL of the server, e.g. `http://localhost:7474`
    pub uri: String,
    pub username: String,
    pub password: String,
    /// Database name, `neo4j` unless the server hosts several
    #[serde(default = "default_database")]
    pub database: String,
}

fn default_database() -> String {
    "neo4j".to_string()
}

impl GraphStoreConfig {
    pub fn new(uri: String, username: String, password: String) -> Self {
        Self {
            uri,
            username,
            password,
            database: default_database(),
        }
    }

    pub fn with_database(mut self, database: String) -> Self {
        self.database = database;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        validate_http_url("Graph URI", &self.uri)?;

        if self.username.is_empty() {
            return Err("Graph username cannot be empty".to_string());
        }

        if self.database.is_empty() {
            return Err("Graph database name cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Row limits and generation settings of the query tools
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryToolLimits {
    /// Rows shown to the model by the tabular tool
    pub max_rows_shown: usize,
    /// Records read back per tabular query
    pub search_row_limit: usize,
    /// Records read back per map query
    pub map_row_limit: usize,
    /// Sampling temperature for query generation
    pub generation_temperature: f32,
}

impl Default for QueryToolLimits {
    fn default() -> Self {
        Self {
            max_rows_shown: 5,
            search_row_limit: 1000,
            map_row_limit: 10000,
            generation_temperature: 0.0,
        }
    }
}

impl QueryToolLimits {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_rows_shown == 0 {
            return Err("max_rows_shown must be at least 1".to_string());
        }
        if self.search_row_limit == 0 || self.map_row_limit == 0 {
            return Err("Row limits must be at least 1".to_string());
        }
        if !(0.0..=2.0).contains(&self.generation_temperature) {
            return Err("Generation temperature must be between 0.0 and 2.0".to_string());
        }
        Ok(())
    }
}

/// Everything the application needs, resolved by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedAppConfig {
    pub llm: ResolvedLlmConfig,
    pub graph: GraphStoreConfig,
    /// Directory with prompt definitions, the bundled ones when unset
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,
    #[serde(default)]
    pub limits: QueryToolLimits,
    #[serde(default = "default_data_source_link")]
    pub data_source_link: String,
}

fn default_data_source_link() -> String {
    DEFAULT_DATA_SOURCE_LINK.to_string()
}

impl ResolvedAppConfig {
    pub fn new(llm: ResolvedLlmConfig, graph: GraphStoreConfig) -> Self {
        Self {
            llm,
            graph,
            prompts_dir: None,
            limits: QueryToolLimits::default(),
            data_source_link: default_data_source_link(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        self.llm.validate()?;
        self.graph.validate()?;
        self.limits.validate()
    }
}

fn validate_http_url(label: &str, url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err(format!("{} cannot be empty", label));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(format!("{} must start with http:// or https://", label));
    }
    Ok(())
}
