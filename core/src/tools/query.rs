//! Question-to-records pipeline shared by the structured-query tools
//!
//! One invocation walks Prompting, Generating, Executing and Shaping before it
//! ends in Responding or Failed. Each stage finishes before the next begins and
//! the store sees exactly one query per invocation.

use crate::error::{Error, GraphError, QueryError, Result};
use crate::graph::{GraphStore, Record};
use crate::llm::{ChatOptions, LlmClient, LlmMessage};
use crate::prompt::{PromptKind, PromptStore, QUESTION_PARAMETER};
use std::fmt;
use std::sync::Arc;

/// Stage of a structured-query tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationStage {
    Prompting,
    Generating,
    Executing,
    Shaping,
    Responding,
    Failed,
}

impl fmt::Display for InvocationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationStage::Prompting => "PROMPTING",
            InvocationStage::Generating => "GENERATING",
            InvocationStage::Executing => "EXECUTING",
            InvocationStage::Shaping => "SHAPING",
            InvocationStage::Responding => "RESPONDING",
            InvocationStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Turns a question into Cypher with a composed prompt
pub struct CypherGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptStore>,
    kind: PromptKind,
    temperature: f32,
}

impl CypherGenerator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptStore>,
        kind: PromptKind,
        temperature: f32,
    ) -> Self {
        Self {
            llm,
            prompts,
            kind,
            temperature,
        }
    }

    /// Bind the question into the composed prompt
    pub async fn prompt(&self, question: &str) -> Result<String> {
        let template = self.prompts.get(self.kind).await?;
        template.render(&[(QUESTION_PARAMETER, question)])
    }

    /// Ask the model for a query answering `prompt`
    pub async fn generate(&self, prompt: String) -> Result<String> {
        let response = self
            .llm
            .chat_completion(
                vec![LlmMessage::user(prompt)],
                None,
                Some(ChatOptions::text_only(self.temperature)),
            )
            .await?;

        let reply = response.message.get_text().unwrap_or_default();
        extract_query(&reply).ok_or_else(|| {
            QueryError::Generation {
                message: "the model returned no query text".to_string(),
            }
            .into()
        })
    }
}

/// Pull the Cypher statement out of a model reply.
///
/// The first fenced block wins, without its language tag. Without a fence the
/// whole trimmed reply is the query.
pub fn extract_query(reply: &str) -> Option<String> {
    let reply = reply.trim();
    let query = match reply.split_once("```") {
        Some((_, rest)) => {
            let block = rest.split("```").next().unwrap_or_default();
            let block = block.trim_start();
            let block = block
                .strip_prefix("cypher")
                .or_else(|| block.strip_prefix("Cypher"))
                .unwrap_or(block);
            block.trim()
        }
        None => reply,
    };

    (!query.is_empty()).then(|| query.to_string())
}

/// Records a query produced, together with the query itself
#[derive(Debug, Clone)]
pub struct ExecutedQuery {
    pub query: String,
    pub records: Vec<Record>,
}

/// Generates a query for a question and runs it once against the store
pub struct QueryPipeline {
    tool: &'static str,
    generator: CypherGenerator,
    graph: Arc<dyn GraphStore>,
    row_limit: usize,
}

impl QueryPipeline {
    pub fn new(
        tool: &'static str,
        generator: CypherGenerator,
        graph: Arc<dyn GraphStore>,
        row_limit: usize,
    ) -> Self {
        Self {
            tool,
            generator,
            graph,
            row_limit,
        }
    }

    /// Run the stages up to Shaping and hand non-empty records to `shape`.
    ///
    /// An empty result is [`QueryError::NoDataFound`]. A query the store
    /// rejects becomes [`QueryError::Rejected`] so the failure names the query.
    pub async fn run<T, F>(&self, question: &str, shape: F) -> Result<T>
    where
        F: FnOnce(&ExecutedQuery) -> Result<T>,
    {
        let mut query: Option<String> = None;
        let result = self.stages(question, &mut query, shape).await;

        match &result {
            Ok(_) => self.enter(InvocationStage::Responding),
            Err(e) => {
                self.enter(InvocationStage::Failed);
                tracing::warn!(
                    tool = self.tool,
                    query = query.as_deref().unwrap_or("<none>"),
                    error = %e,
                    "Query tool invocation failed"
                );
            }
        }
        result
    }

    async fn stages<T, F>(&self, question: &str, query: &mut Option<String>, shape: F) -> Result<T>
    where
        F: FnOnce(&ExecutedQuery) -> Result<T>,
    {
        self.enter(InvocationStage::Prompting);
        let prompt = self.generator.prompt(question).await?;

        self.enter(InvocationStage::Generating);
        let generated = self.generator.generate(prompt).await?;
        tracing::info!(tool = self.tool, query = %generated, "Generated cypher");
        *query = Some(generated.clone());

        self.enter(InvocationStage::Executing);
        let records = self
            .graph
            .run(&generated, self.row_limit)
            .await
            .map_err(|e| match e {
                Error::Graph(GraphError::Query { code, message }) => QueryError::Rejected {
                    query: generated.clone(),
                    message: format!("{} ({})", message, code),
                }
                .into(),
                other => other,
            })?;

        self.enter(InvocationStage::Shaping);
        if records.is_empty() {
            return Err(QueryError::NoDataFound { query: generated }.into());
        }
        tracing::debug!(tool = self.tool, rows = records.len(), "Shaping query result");

        shape(&ExecutedQuery {
            query: generated,
            records,
        })
    }

    fn enter(&self, stage: InvocationStage) {
        tracing::debug!(tool = self.tool, stage = %stage, "Query tool stage");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_fenced_query() {
        let reply = "Here you go:\n```cypher\nMATCH (s:Substance)\nRETURN s.name\n```\nAnything else?";
        assert_eq!(
            extract_query(reply).as_deref(),
            Some("MATCH (s:Substance)\nRETURN s.name")
        );

        let reply = "```\nMATCH (n) RETURN n\n```";
        assert_eq!(extract_query(reply).as_deref(), Some("MATCH (n) RETURN n"));
    }

    #[test]
    fn test_extract_plain_query() {
        assert_eq!(
            extract_query("  MATCH (l:Site) RETURN l.name AS SiteName \n").as_deref(),
            Some("MATCH (l:Site) RETURN l.name AS SiteName")
        );
        assert_eq!(extract_query("   "), None);
        assert_eq!(extract_query("```cypher\n```"), None);
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(InvocationStage::Executing.to_string(), "EXECUTING");
        assert_eq!(InvocationStage::Failed.to_string(), "FAILED");
    }
}
