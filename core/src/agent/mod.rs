//! Conversational agent driving the tools

pub mod base;
pub mod config;
pub mod core;
pub mod execution;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig};
pub use core::AgentCore;
pub use execution::AgentExecution;
