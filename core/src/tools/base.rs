//! Base tool traits and structures

use crate::error::{Result, ToolError};
use crate::shaping::Figure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use uuid::Uuid;

/// Name of the single free-text input every tool accepts
pub const QUERY_PARAMETER: &str = "query";

/// Whether a tool answers with text only or text plus a chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    Content,
    ContentAndArtifact,
}

/// Trait for all tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the name of the tool
    fn name(&self) -> &str;

    /// Get the description of the tool
    fn description(&self) -> &str;

    /// Description of the `query` input shown to the model
    fn query_description(&self) -> &str;

    /// Whether results may carry an artifact
    fn response_mode(&self) -> ResponseMode {
        ResponseMode::Content
    }

    /// Get the JSON schema for the tool's parameters
    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                QUERY_PARAMETER: {
                    "type": "string",
                    "description": self.query_description()
                }
            },
            "required": [QUERY_PARAMETER]
        })
    }

    /// Execute the tool with the given parameters
    async fn execute(&self, call: ToolCall) -> Result<ToolResult>;

    /// Get examples of how to use this tool
    fn examples(&self) -> Vec<ToolExample> {
        Vec::new()
    }

    /// Catalog entry declared to the model
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.parameters_schema(),
            response_mode: self.response_mode(),
        }
    }
}

/// What the model is told about a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
    pub response_mode: ResponseMode,
}

impl ToolSpec {
    pub fn to_definition(&self) -> crate::llm::ToolDefinition {
        crate::llm::ToolDefinition {
            tool_type: "function".to_string(),
            function: crate::llm::FunctionDefinition {
                name: self.name.clone(),
                description: self.description.clone(),
                parameters: self.input_schema.clone(),
            },
        }
    }
}

/// A call to a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,

    /// Name of the tool to call
    pub name: String,

    /// Parameters to pass to the tool
    pub parameters: serde_json::Value,
}

/// Result of a tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// ID of the tool call this is a result for
    pub tool_call_id: String,

    /// Whether the execution failed; `content` then explains why
    pub failed: bool,

    /// Text for the model
    pub content: String,

    /// Chart produced alongside the text
    pub artifact: Option<Figure>,

    /// Execution duration in milliseconds
    pub duration_ms: Option<u64>,
}

/// Example usage of a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolExample {
    /// Description of what this example does
    pub description: String,

    /// Example parameters
    pub parameters: serde_json::Value,
}

impl ToolExample {
    pub fn query(description: &str, query: &str) -> Self {
        Self {
            description: description.to_string(),
            parameters: json!({ QUERY_PARAMETER: query }),
        }
    }
}

impl ToolCall {
    /// Create a new tool call
    pub fn new<S: Into<String>>(name: S, parameters: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            parameters,
        }
    }

    /// Call carrying a single free-text query
    pub fn with_query<S: Into<String>>(name: S, query: &str) -> Self {
        Self::new(name, json!({ QUERY_PARAMETER: query }))
    }

    /// Get a parameter value by key
    pub fn get_parameter<T>(&self, key: &str) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let value = self
            .parameters
            .get(key)
            .ok_or_else(|| ToolError::InvalidParameters {
                message: format!("Missing parameter: {}", key),
            })?;

        serde_json::from_value(value.clone()).map_err(|_| {
            ToolError::InvalidParameters {
                message: format!("Invalid parameter type for: {}", key),
            }
            .into()
        })
    }

    /// The non-empty free-text query of this call
    pub fn query(&self) -> Result<String> {
        let query: String = self.get_parameter(QUERY_PARAMETER)?;
        if query.trim().is_empty() {
            return Err(ToolError::InvalidParameters {
                message: "The query must not be empty".to_string(),
            }
            .into());
        }
        Ok(query)
    }
}

impl ToolResult {
    /// Create a successful result
    pub fn success<S: Into<String>>(tool_call_id: S, content: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            failed: false,
            content: content.into(),
            artifact: None,
            duration_ms: None,
        }
    }

    /// Create a failed result the model can react to
    pub fn failure<S: Into<String>>(tool_call_id: S, message: S) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            failed: true,
            content: message.into(),
            artifact: None,
            duration_ms: None,
        }
    }

    /// Attach a chart
    pub fn with_artifact(mut self, artifact: Figure) -> Self {
        self.artifact = Some(artifact);
        self
    }

    /// Set execution duration
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Routes tool calls to registered tools
pub struct ToolExecutor {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolExecutor {
    /// Create a new tool executor
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Names of all registered tools, sorted
    pub fn list_tools(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Execute a tool call.
    ///
    /// Recoverable failures, including an unknown tool name, come back as a
    /// failed [`ToolResult`]. Anything else is returned as `Err` and ends the turn.
    pub async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let start_time = std::time::Instant::now();
        let call_id = call.id.clone();
        let tool_name = call.name.clone();

        let result = match self.get_tool(&call.name) {
            Some(tool) => tool.execute(call).await,
            None => Err(ToolError::NotFound {
                name: call.name.clone(),
            }
            .into()),
        };
        let duration = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(result) => Ok(result.with_duration(duration)),
            Err(e) if e.is_recoverable() => {
                tracing::warn!(tool = %tool_name, error = %e, "Tool call failed");
                Ok(ToolResult::failure(call_id, e.to_string()).with_duration(duration))
            }
            Err(e) => {
                tracing::error!(tool = %tool_name, error = %e, "Tool call aborted");
                Err(e)
            }
        }
    }

    /// Route a single free-text query to the named tool
    pub async fn dispatch(&self, name: &str, query: &str) -> Result<ToolResult> {
        self.execute(ToolCall::with_query(name, query)).await
    }

    /// Catalog of all registered tools, sorted by name
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.list_tools()
            .into_iter()
            .filter_map(|name| self.get_tool(name))
            .map(|tool| tool.spec())
            .collect()
    }

    /// Get tool definitions for LLM function calling
    pub fn get_tool_definitions(&self) -> Vec<crate::llm::ToolDefinition> {
        self.specs().iter().map(ToolSpec::to_definition).collect()
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, GraphError, PromptError, QueryError};

    /// Tool whose behavior is chosen by the query text
    struct ScriptedTool;

    #[async_trait]
    impl Tool for ScriptedTool {
        fn name(&self) -> &str {
            "Scripted"
        }

        fn description(&self) -> &str {
            "Answers according to the query"
        }

        fn query_description(&self) -> &str {
            "One of ok, no-data, offline, defect"
        }

        async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
            match call.query()?.as_str() {
                "ok" => Ok(ToolResult::success(call.id, "fine".to_string())),
                "no-data" => Err(QueryError::NoDataFound {
                    query: "MATCH (n:Nothing) RETURN n".to_string(),
                }
                .into()),
                "offline" => Err(GraphError::Connection {
                    message: "connection refused".to_string(),
                }
                .into()),
                _ => Err(PromptError::SelfAppend {
                    prompt: "basic_intro".to_string(),
                }
                .into()),
            }
        }
    }

    fn executor() -> ToolExecutor {
        let mut executor = ToolExecutor::new();
        executor.register_tool(Box::new(ScriptedTool));
        executor
    }

    #[tokio::test]
    async fn test_success_keeps_call_id_and_sets_duration() {
        let call = ToolCall::with_query("Scripted", "ok");
        let id = call.id.clone();
        let result = executor().execute(call).await.unwrap();

        assert!(!result.failed);
        assert_eq!(result.tool_call_id, id);
        assert!(result.duration_ms.is_some());
    }

    #[tokio::test]
    async fn test_recoverable_errors_become_failed_results() {
        let executor = executor();

        let result = executor.dispatch("Scripted", "no-data").await.unwrap();
        assert!(result.failed);
        assert!(result.content.contains("MATCH (n:Nothing) RETURN n"));

        let result = executor.dispatch("Scripted", "   ").await.unwrap();
        assert!(result.failed);

        let result = executor.dispatch("Unknown", "ok").await.unwrap();
        assert!(result.failed);
        assert!(result.content.contains("Unknown"));
    }

    #[tokio::test]
    async fn test_fatal_errors_propagate() {
        let executor = executor();

        let err = executor.dispatch("Scripted", "offline").await.unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::Connection { .. })));

        let err = executor.dispatch("Scripted", "defect").await.unwrap_err();
        assert!(matches!(err, Error::Prompt(_)));
    }

    #[test]
    fn test_specs_and_definitions() {
        let executor = executor();
        let specs = executor.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].response_mode, ResponseMode::Content);
        assert_eq!(specs[0].input_schema["required"], json!(["query"]));

        let definitions = executor.get_tool_definitions();
        assert_eq!(definitions[0].function.name, "Scripted");
        assert_eq!(definitions[0].tool_type, "function");
    }
}
