//! Map answers: measured sites drawn on a map of Europe

use crate::error::Result;
use crate::impl_tool_factory;
use crate::prompt::PromptKind;
use crate::shaping::{describe, Figure, MapShape};
use crate::tools::query::{CypherGenerator, QueryPipeline};
use crate::tools::{ResponseMode, Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;

pub const NAME: &str = "GeographicMap";

pub const DESCRIPTION: &str = "Fetches the locations and measurements of chemicals in European \
surface waters from a graph database and shows the sampling sites on a map. \
The input must be a complete sentence requesting sites. Example inputs:\n\n\
Show sites where Diuron has been measured on the European map.\n\
Show Diuron's measured concentrations on the European map.\n\
Show Diuron's toxic unit (TU) distribution since 2010 for the species algae (unicellular).\n\
Show Diuron's driver importance distribution in France between January 2010 and December 2012.";

const QUERY_DESCRIPTION: &str = "Human readable question that asks where a specific substance \
(e.g., Atrazine) has been measured or detected, optionally in a certain time frame (e.g., in the \
year 2011) and/or with toxicity information for a certain species (e.g., algae), to generate a \
map of the relevant sampling sites for entire Europe or a given lake, river or country.";

/// Answers a question with a scatter map and statistics for the caption
pub struct GeographicMapTool {
    pipeline: QueryPipeline,
}

impl GeographicMapTool {
    pub fn new(context: &ToolContext) -> Self {
        let generator = CypherGenerator::new(
            context.llm.clone(),
            context.prompts.clone(),
            PromptKind::CypherMap,
            context.limits.generation_temperature,
        );
        Self {
            pipeline: QueryPipeline::new(
                NAME,
                generator,
                context.graph.clone(),
                context.limits.map_row_limit,
            ),
        }
    }
}

fn caption_request(summary: &serde_json::Value) -> String {
    format!(
        "A map with annotated sites is shown to the user.\n\
         You receive the summarized statistics of the data that is shown on the map.\n\
         Create a compelling figure caption from the summarized statistics.\n\n\
         <summary>\n{}\n</summary>",
        summary
    )
}

#[async_trait]
impl Tool for GeographicMapTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        DESCRIPTION
    }

    fn query_description(&self) -> &str {
        QUERY_DESCRIPTION
    }

    fn response_mode(&self) -> ResponseMode {
        ResponseMode::ContentAndArtifact
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let question = call.query()?;
        let (content, figure) = self
            .pipeline
            .run(&question, |executed| {
                let summary = describe(&executed.records);
                let shape = MapShape::from_records(&executed.records, &executed.query)?;
                tracing::debug!(sites = shape.sites.len(), kind = shape.kind.column(), "Shaped map");
                Ok((caption_request(&summary), Figure::scatter_geo(&shape)))
            })
            .await?;

        Ok(ToolResult::success(call.id, content).with_artifact(figure))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![
            ToolExample::query(
                "Measured concentrations",
                "Show Diuron's measured concentrations on the European map.",
            ),
            ToolExample::query(
                "Toxic pressure on a species group",
                "Show the sum of toxic units for algae since 2010 on the map.",
            ),
        ]
    }
}

impl_tool_factory!(
    GeographicMapToolFactory,
    GeographicMapTool,
    NAME,
    DESCRIPTION
);
