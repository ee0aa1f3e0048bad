//! Minimal configuration module for EcoToxFred core
//!
//! Only exports pure data types. All loading logic is in CLI layer.

pub mod types;

pub use types::{
    GraphStoreConfig, ModelParams, Protocol, QueryToolLimits, ResolvedAppConfig,
    ResolvedLlmConfig, DEFAULT_DATA_SOURCE_LINK,
};
