//! # EcoToxFred Core
//!
//! Core library for EcoToxFred, a conversational assistant over a graph of
//! chemical contamination measurements in European surface waters.
//!
//! The library composes the prompts the model works with, turns questions
//! into Cypher through query tools, shapes the returned records into tables
//! and maps, and runs the agent loop that ties these together.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod graph;
pub mod llm;
pub mod prompt;
pub mod shaping;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentCore, AgentExecution};
pub use config::{GraphStoreConfig, ModelParams, Protocol, ResolvedAppConfig, ResolvedLlmConfig};
pub use error::{Error, Result};
pub use prompt::{PromptKind, PromptStore};
pub use shaping::Figure;

/// Current version of the ecotoxfred-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for the library
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// Initialize tracing with a specific debug mode
pub fn init_tracing_with_debug(debug: bool) {
    let filter = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
