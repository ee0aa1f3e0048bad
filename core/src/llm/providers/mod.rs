//! LLM provider implementations

pub mod openai;

pub use openai::OpenAiClient;

use crate::config::{Protocol, ResolvedLlmConfig};
use crate::error::Result;
use crate::llm::LlmClient;
use std::sync::Arc;

/// Build the client for a resolved configuration
pub fn create_llm_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>> {
    match config.protocol {
        Protocol::OpenAICompat | Protocol::AzureOpenAI => Ok(Arc::new(OpenAiClient::new(config)?)),
    }
}
