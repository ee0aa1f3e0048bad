//! Agent configuration structures

use crate::config::ResolvedAppConfig;
use crate::error::{ConfigError, Result};
use crate::graph::{GraphStore, Neo4jHttpStore};
use crate::llm::{create_llm_client, LlmClient};
use crate::prompt::{PromptKind, PromptStore};
use crate::tools::{ToolContext, ToolRegistry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Configuration for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum number of model round trips per turn
    pub max_steps: usize,

    /// List of tools available to this agent
    pub tools: Vec<String>,

    /// Custom system prompt (optional)
    /// If not provided, the composed agent prompt is used
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: 10,
            tools: vec![
                "CypherSearch".to_string(),
                "GeographicMap".to_string(),
                "Wikipedia".to_string(),
            ],
            system_prompt: None,
        }
    }
}

/// Builder wiring the model, graph store and prompts into an agent
pub struct AgentBuilder {
    app_config: ResolvedAppConfig,
    agent_config: AgentConfig,
    llm_client: Option<Arc<dyn LlmClient>>,
    graph: Option<Arc<dyn GraphStore>>,
}

impl AgentBuilder {
    pub fn new(app_config: ResolvedAppConfig) -> Self {
        Self {
            app_config,
            agent_config: AgentConfig::default(),
            llm_client: None,
            graph: None,
        }
    }

    /// Set agent configuration
    pub fn with_agent_config(mut self, agent_config: AgentConfig) -> Self {
        self.agent_config = agent_config;
        self
    }

    /// Set maximum steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.agent_config.max_steps = max_steps;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.agent_config.tools = tools;
        self
    }

    /// Use this client instead of one built from the LLM configuration
    pub fn with_llm_client(mut self, llm_client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(llm_client);
        self
    }

    /// Use this store instead of connecting to the configured Neo4j server
    pub fn with_graph_store(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn prompt_store(&self) -> PromptStore {
        match &self.app_config.prompts_dir {
            Some(dir) => PromptStore::new(dir),
            None => PromptStore::default(),
        }
    }

    /// Build the agent. Every prompt is composed and the graph connection is
    /// checked up front, so broken definitions or an unreachable database fail
    /// here rather than in the middle of a conversation.
    pub async fn build(self) -> Result<super::AgentCore> {
        self.app_config
            .limits
            .validate()
            .map_err(|value| ConfigError::InvalidValue {
                field: "limits".to_string(),
                value,
            })?;

        let prompts = Arc::new(self.prompt_store());
        prompts.preload().await?;

        let llm_client = match self.llm_client {
            Some(client) => client,
            None => create_llm_client(&self.app_config.llm)?,
        };
        let graph: Arc<dyn GraphStore> = match self.graph {
            Some(graph) => graph,
            None => Arc::new(Neo4jHttpStore::connect(self.app_config.graph.clone()).await?),
        };

        let system_prompt = match &self.agent_config.system_prompt {
            Some(prompt) => prompt.clone(),
            None => prompts.get(PromptKind::Agent).await?.render(&[])?,
        };

        let context = ToolContext::new(llm_client.clone(), graph, prompts)
            .with_limits(self.app_config.limits.clone())
            .with_data_source_link(self.app_config.data_source_link.clone());
        let tool_executor =
            ToolRegistry::default().create_executor(&self.agent_config.tools, &context);

        Ok(super::AgentCore::new(
            self.agent_config,
            llm_client,
            tool_executor,
            system_prompt,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GraphStoreConfig, Protocol, ResolvedLlmConfig};
    use crate::graph::MemoryGraphStore;

    fn app_config() -> ResolvedAppConfig {
        ResolvedAppConfig::new(
            ResolvedLlmConfig::new(
                Protocol::OpenAICompat,
                "https://api.openai.com/v1".to_string(),
                "sk-test".to_string(),
                "gpt-4o".to_string(),
            ),
            GraphStoreConfig::new(
                "http://localhost:7474".to_string(),
                "neo4j".to_string(),
                "secret".to_string(),
            ),
        )
    }

    #[tokio::test]
    async fn test_build_uses_agent_prompt_and_requested_tools() {
        let agent = AgentBuilder::new(app_config())
            .with_graph_store(Arc::new(MemoryGraphStore::default()))
            .with_tools(vec!["CypherSearch".to_string(), "Nonexistent".to_string()])
            .with_max_steps(4)
            .build()
            .await
            .unwrap();

        assert_eq!(agent.tool_executor().list_tools(), vec!["CypherSearch"]);
        assert!(agent.system_prompt().contains("EcoToxFred"));
        assert_eq!(agent.llm_client().model_name(), "gpt-4o");
    }

    #[tokio::test]
    async fn test_build_rejects_invalid_limits() {
        let mut config = app_config();
        config.limits.max_rows_shown = 0;

        let result = AgentBuilder::new(config)
            .with_graph_store(Arc::new(MemoryGraphStore::default()))
            .build()
            .await;
        assert!(result.is_err());
    }
}
