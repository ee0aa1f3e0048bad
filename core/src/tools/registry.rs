//! Tool registry for managing available tools

use crate::config::QueryToolLimits;
use crate::graph::GraphStore;
use crate::llm::LlmClient;
use crate::prompt::PromptStore;
use crate::tools::{Tool, ToolExecutor};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shared collaborators handed to tool factories
#[derive(Clone)]
pub struct ToolContext {
    pub llm: Arc<dyn LlmClient>,
    pub graph: Arc<dyn GraphStore>,
    pub prompts: Arc<PromptStore>,
    pub limits: QueryToolLimits,
    pub data_source_link: String,
    pub http: reqwest::Client,
}

impl ToolContext {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        graph: Arc<dyn GraphStore>,
        prompts: Arc<PromptStore>,
    ) -> Self {
        Self {
            llm,
            graph,
            prompts,
            limits: QueryToolLimits::default(),
            data_source_link: crate::config::DEFAULT_DATA_SOURCE_LINK.to_string(),
            http: reqwest::Client::new(),
        }
    }

    pub fn with_limits(mut self, limits: QueryToolLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_data_source_link(mut self, link: impl Into<String>) -> Self {
        self.data_source_link = link.into();
        self
    }
}

/// Registry for managing tool creation and registration
pub struct ToolRegistry {
    factories: BTreeMap<String, Box<dyn ToolFactory>>,
}

/// Factory trait for creating tools
pub trait ToolFactory: Send + Sync {
    /// Create a new instance of the tool
    fn create(&self, context: &ToolContext) -> Box<dyn Tool>;

    /// Get the name of the tool this factory creates
    fn tool_name(&self) -> &str;

    /// Get the description of the tool this factory creates
    fn tool_description(&self) -> &str;
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Register a tool factory
    pub fn register_factory(&mut self, factory: Box<dyn ToolFactory>) {
        self.factories
            .insert(factory.tool_name().to_string(), factory);
    }

    /// Create a tool by name
    pub fn create_tool(&self, name: &str, context: &ToolContext) -> Option<Box<dyn Tool>> {
        self.factories.get(name).map(|factory| factory.create(context))
    }

    /// List all available tool names
    pub fn list_tools(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Get tool information
    pub fn get_tool_info(&self, name: &str) -> Option<(&str, &str)> {
        self.factories
            .get(name)
            .map(|factory| (factory.tool_name(), factory.tool_description()))
    }

    /// Create a tool executor with the specified tools
    pub fn create_executor(&self, tool_names: &[String], context: &ToolContext) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for name in tool_names {
            match self.create_tool(name, context) {
                Some(tool) => executor.register_tool(tool),
                None => tracing::warn!(tool = %name, "Unknown tool requested"),
            }
        }

        executor
    }

    /// Create a tool executor with all available tools
    pub fn create_executor_with_all(&self, context: &ToolContext) -> ToolExecutor {
        let mut executor = ToolExecutor::new();

        for factory in self.factories.values() {
            executor.register_tool(factory.create(context));
        }

        executor
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        let mut registry = Self::new();

        registry.register_factory(Box::new(crate::tools::builtin::CypherSearchToolFactory));
        registry.register_factory(Box::new(crate::tools::builtin::GeographicMapToolFactory));
        registry.register_factory(Box::new(crate::tools::builtin::WikipediaToolFactory));

        registry
    }
}

/// Macro to help implement tool factories
#[macro_export]
macro_rules! impl_tool_factory {
    ($factory:ident, $tool:ident, $name:expr, $description:expr) => {
        pub struct $factory;

        impl $crate::tools::ToolFactory for $factory {
            fn create(
                &self,
                context: &$crate::tools::ToolContext,
            ) -> Box<dyn $crate::tools::Tool> {
                Box::new($tool::new(context))
            }

            fn tool_name(&self) -> &str {
                $name
            }

            fn tool_description(&self) -> &str {
                $description
            }
        }
    };
}
