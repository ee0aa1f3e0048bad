//! Error types and handling for EcoToxFred Core

use thiserror::Error;

/// Result type alias for EcoToxFred operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for EcoToxFred Core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Prompt definition and composition errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Structured query generation and result shaping errors
    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    /// Graph store errors
    #[error("Graph store error: {0}")]
    Graph(#[from] GraphError),

    /// LLM client errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Tool execution errors
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML definition parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// Whether the failure should be handed back to the model as a failed tool
    /// result instead of aborting the turn.
    ///
    /// Prompt composition errors are defects in the prompt definitions and an
    /// unreachable graph store cannot be fixed by rephrasing, so both propagate.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::Query(_) | Error::Llm(_) | Error::Tool(_) | Error::Http(_) => true,
            Error::Graph(GraphError::Query { .. }) => true,
            Error::Graph(GraphError::Connection { .. }) => false,
            _ => false,
        }
    }
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },
}

/// Prompt fragment and example collection errors
#[derive(Error, Debug, PartialEq)]
pub enum PromptError {
    #[error("Malformed identifier '{name}': only lowercase letters and underscores are allowed")]
    MalformedIdentifier { name: String },

    #[error("Unknown parameter '{parameter}' for prompt '{prompt}'")]
    UnknownParameter { prompt: String, parameter: String },

    #[error("Prompt '{prompt}' has no placeholder '{placeholder}'")]
    MissingPlaceholder { prompt: String, placeholder: String },

    #[error("Example collection '{collection}' is empty")]
    EmptyExampleCollection { collection: String },

    #[error("Cannot append prompt '{prompt}' to itself")]
    SelfAppend { prompt: String },

    #[error("Prompt '{prompt}' uses undeclared placeholder '{placeholder}'")]
    UndeclaredPlaceholder { prompt: String, placeholder: String },

    #[error("Prompt '{prompt}' is missing values for: {}", parameters.join(", "))]
    MissingParameters {
        prompt: String,
        parameters: Vec<String>,
    },

    #[error("Invalid prompt definition '{name}': {message}")]
    InvalidDefinition { name: String, message: String },

    #[error("Unknown prompt fragment: {name}")]
    UnknownFragment { name: String },
}

/// Errors raised while generating, running or shaping a structured query
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("No data was found for the following cypher: {query}")]
    NoDataFound { query: String },

    #[error(
        "Could not create a map from the data of the following cypher: {query} \
         The rendering error was: {message}"
    )]
    ArtifactRender { query: String, message: String },

    #[error("The graph database rejected the following cypher: {query} The error was: {message}")]
    Rejected { query: String, message: String },

    #[error("No cypher query could be generated: {message}")]
    Generation { message: String },
}

/// Graph store errors
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Could not connect to the graph database: {message}")]
    Connection { message: String },

    #[error("The graph database rejected the query ({code}): {message}")]
    Query { code: String, message: String },
}

/// LLM client errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    #[error("Invalid tool parameters: {message}")]
    InvalidParameters { message: String },
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Maximum steps exceeded: {max_steps}")]
    MaxStepsExceeded { max_steps: usize },

    #[error("Invalid task: {message}")]
    InvalidTask { message: String },
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Generic(msg)
    }
}

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Generic(msg.to_string())
    }
}
