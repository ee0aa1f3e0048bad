//! Tool system and built-in tools

pub mod base;
pub mod builtin;
pub mod query;
pub mod registry;

pub use base::{
    ResponseMode, Tool, ToolCall, ToolExample, ToolExecutor, ToolResult, ToolSpec,
    QUERY_PARAMETER,
};
pub use query::{extract_query, CypherGenerator, ExecutedQuery, InvocationStage, QueryPipeline};
pub use registry::{ToolContext, ToolFactory, ToolRegistry};
