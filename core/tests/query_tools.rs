//! End-to-end behavior of the query tools against an in-memory graph

use async_trait::async_trait;
use ecotoxfred_core::error::{Error, GraphError, Result};
use ecotoxfred_core::graph::{GraphStore, MemoryGraphStore};
use ecotoxfred_core::llm::{ChatOptions, LlmClient, LlmMessage, LlmResponse, ToolDefinition};
use ecotoxfred_core::prompt::PromptStore;
use ecotoxfred_core::tools::{ToolContext, ToolExecutor, ToolRegistry};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

const SEARCH_QUERY: &str = "MATCH (s:Site)-[m:MEASURED_AT]-(c:Substance {Name: 'Diuron'}) \
RETURN s.Name AS SiteName, m.concentration_value AS Concentration";

const MAP_QUERY: &str = "MATCH (s:Site)-[r:SUMMARIZED_IMPACT_ON]->(:Species) \
RETURN s.Name AS SiteName, s.Lat AS Lat, s.Lon AS Lon, r.sumTU AS sumTU";

/// Answers every generation request with one fenced cypher block
struct FixedCypherLlm {
    query: String,
    prompts: Mutex<Vec<String>>,
}

impl FixedCypherLlm {
    fn new(query: &str) -> Arc<Self> {
        Arc::new(Self {
            query: query.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl LlmClient for FixedCypherLlm {
    async fn chat_completion(
        &self,
        messages: Vec<LlmMessage>,
        tools: Option<Vec<ToolDefinition>>,
        _options: Option<ChatOptions>,
    ) -> Result<LlmResponse> {
        assert!(tools.is_none(), "query generation must not offer tools");
        if let Some(text) = messages.last().and_then(|m| m.get_text()) {
            self.prompts.lock().unwrap().push(text);
        }
        Ok(LlmResponse::text(
            "fixed",
            format!("```cypher\n{}\n```", self.query),
        ))
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn provider_name(&self) -> &str {
        "test"
    }
}

fn executor(llm: Arc<FixedCypherLlm>, graph: Arc<dyn GraphStore>) -> ToolExecutor {
    let context = ToolContext::new(llm, graph, Arc::new(PromptStore::default()));
    ToolRegistry::default().create_executor_with_all(&context)
}

fn rows(values: Vec<Value>) -> Arc<MemoryGraphStore> {
    Arc::new(MemoryGraphStore::from_json(values))
}

#[tokio::test]
async fn search_without_records_reports_the_query() {
    let llm = FixedCypherLlm::new(SEARCH_QUERY);
    let graph = rows(vec![]);
    let executor = executor(llm.clone(), graph.clone());

    let result = executor
        .dispatch("CypherSearch", "Where was Diuron measured?")
        .await
        .unwrap();

    assert!(result.failed);
    assert!(result.content.contains("No data was found"));
    assert!(result.content.contains(SEARCH_QUERY));
    assert_eq!(graph.executed(), vec![SEARCH_QUERY.to_string()]);

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Where was Diuron measured?"));
}

#[tokio::test]
async fn search_crops_large_results_but_summarizes_all_rows() {
    let records = (1..=8)
        .map(|i| json!({"SiteName": format!("Site {}", i), "Concentration": i as f64}))
        .collect();
    let executor = executor(FixedCypherLlm::new(SEARCH_QUERY), rows(records));

    let result = executor
        .dispatch("CypherSearch", "List Diuron concentrations")
        .await
        .unwrap();

    assert!(!result.failed);
    assert!(result.artifact.is_none());
    assert!(result
        .content
        .contains("The full result of 8 rows was cropped to 5 rows:"));
    assert!(result.content.contains("Site 5"));
    assert!(!result.content.contains("Site 6\""));
    assert!(result.content.contains("\"count\":8"));
    assert!(result.content.contains(SEARCH_QUERY));
}

#[tokio::test]
async fn map_aggregates_values_per_site() {
    let records = vec![
        json!({"SiteName": "Rhine A", "Lat": 50.0, "Lon": 7.0, "sumTU": 1.0}),
        json!({"SiteName": "Rhine A", "Lat": 50.0, "Lon": 7.0, "sumTU": 3.0}),
        json!({"SiteName": "Danube B", "Lat": 48.2, "Lon": 16.4, "sumTU": 0.5}),
        json!({"SiteName": "Elbe C", "Lat": 53.5, "Lon": 10.0, "sumTU": 2.5}),
    ];
    let executor = executor(FixedCypherLlm::new(MAP_QUERY), rows(records));

    let result = executor
        .dispatch("GeographicMap", "Show the sum of toxic units on the map")
        .await
        .unwrap();

    assert!(!result.failed);
    assert!(result.content.contains("Create a compelling figure caption"));
    let figure = result.artifact.expect("map result carries a figure");
    assert_eq!(figure.point_count(), 3);

    let trace = &figure.data[0];
    assert_eq!(trace["marker"]["color"], json!([2.0, 0.5, 2.5]));
    assert_eq!(trace["marker"]["colorbar"]["title"]["text"], json!("sumTU"));
}

#[tokio::test]
async fn map_without_value_column_shows_occurrence() {
    let query = "MATCH (s:Site) RETURN s.Name AS SiteName, s.Lat AS Lat, s.Lon AS Lon";
    let records = vec![
        json!({"SiteName": "Rhine A", "Lat": 50.0, "Lon": 7.0}),
        json!({"SiteName": "Rhine A", "Lat": 50.0, "Lon": 7.0}),
        json!({"SiteName": "Danube B", "Lat": 48.2, "Lon": 16.4}),
    ];
    let executor = executor(FixedCypherLlm::new(query), rows(records));

    let result = executor
        .dispatch("GeographicMap", "Where was Diuron measured?")
        .await
        .unwrap();

    let figure = result.artifact.expect("map result carries a figure");
    assert_eq!(figure.point_count(), 2);
    assert!(figure.data[0]["marker"].get("colorscale").is_none());
}

#[tokio::test]
async fn map_missing_coordinates_is_reported_to_the_model() {
    let executor = executor(
        FixedCypherLlm::new(SEARCH_QUERY),
        rows(vec![json!({"SiteName": "Rhine A", "Concentration": 1.0})]),
    );

    let result = executor
        .dispatch("GeographicMap", "Where was Diuron measured?")
        .await
        .unwrap();

    assert!(result.failed);
    assert!(result.artifact.is_none());
    assert!(result.content.contains("Lat, Lon"));
}

#[tokio::test]
async fn rejected_query_is_reported_with_its_text() {
    let graph = Arc::new(MemoryGraphStore::failing(GraphError::Query {
        code: "Neo.ClientError.Statement.SyntaxError".to_string(),
        message: "Invalid input 'RETRUN'".to_string(),
    }));
    let executor = executor(FixedCypherLlm::new(SEARCH_QUERY), graph);

    let result = executor
        .dispatch("CypherSearch", "List Diuron concentrations")
        .await
        .unwrap();

    assert!(result.failed);
    assert!(result.content.contains(SEARCH_QUERY));
    assert!(result.content.contains("Invalid input"));
}

#[tokio::test]
async fn unreachable_graph_ends_the_call() {
    let graph = Arc::new(MemoryGraphStore::failing(GraphError::Connection {
        message: "connection refused".to_string(),
    }));
    let executor = executor(FixedCypherLlm::new(SEARCH_QUERY), graph);

    let err = executor
        .dispatch("CypherSearch", "List Diuron concentrations")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Graph(GraphError::Connection { .. })));
}
