//! Tabular answers from the graph database

use crate::error::Result;
use crate::impl_tool_factory;
use crate::prompt::PromptKind;
use crate::shaping::TableShape;
use crate::tools::query::{CypherGenerator, QueryPipeline};
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;

pub const NAME: &str = "CypherSearch";

pub const DESCRIPTION: &str = "Fetches information about chemicals, their measured concentrations, \
toxic units and driver importance in European surface waters from a graph database and returns \
it as a table. Use it for questions about substances, sampling sites, rivers, river basins, \
countries and time frames. The input must be a complete question.";

const QUERY_DESCRIPTION: &str = "Human readable question about chemicals measured in European \
surface waters, e.g. which substances were measured in the Seine or where Diuron exceeded a \
concentration threshold.";

/// Answers a question with a cropped table, statistics and the query used
pub struct CypherSearchTool {
    pipeline: QueryPipeline,
    max_rows_shown: usize,
    data_source_link: String,
}

impl CypherSearchTool {
    pub fn new(context: &ToolContext) -> Self {
        let generator = CypherGenerator::new(
            context.llm.clone(),
            context.prompts.clone(),
            PromptKind::CypherGeneral,
            context.limits.generation_temperature,
        );
        Self {
            pipeline: QueryPipeline::new(
                NAME,
                generator,
                context.graph.clone(),
                context.limits.search_row_limit,
            ),
            max_rows_shown: context.limits.max_rows_shown,
            data_source_link: context.data_source_link.clone(),
        }
    }
}

#[async_trait]
impl Tool for CypherSearchTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn query_description(&self) -> &str {
        QUERY_DESCRIPTION
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let question = call.query()?;
        let content = self
            .pipeline
            .run(&question, |executed| {
                let table =
                    TableShape::new(executed.records.clone(), self.max_rows_shown, &executed.query)?;
                Ok(table.to_content(&executed.query, &self.data_source_link))
            })
            .await?;

        Ok(ToolResult::success(call.id, content))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![
            ToolExample::query(
                "Substances measured in a river",
                "Which chemicals were measured in the Seine?",
            ),
            ToolExample::query(
                "Driver chemicals",
                "What are the 10 most frequent driver chemicals with a driver importance above 0.6?",
            ),
        ]
    }
}

impl_tool_factory!(
    CypherSearchToolFactory,
    CypherSearchTool,
    NAME,
    DESCRIPTION
);
