//! Encyclopedic lookup through the MediaWiki API

use crate::error::Result;
use crate::impl_tool_factory;
use crate::tools::{Tool, ToolCall, ToolContext, ToolExample, ToolResult};
use async_trait::async_trait;
use serde_json::Value;

pub const NAME: &str = "Wikipedia";

pub const DESCRIPTION: &str = "A specialized wrapper around Wikipedia for retrieving detailed \
information about chemicals, their properties, uses, environmental behavior, and toxicity. \
Useful for answering questions about chemical substances relevant to environmental monitoring, \
their potential toxicity to aquatic species (e.g., algae, daphnia/crustaceans, and fish), and \
their environmental impact. Input should be a search query related to a chemical or its \
associated properties.";

const QUERY_DESCRIPTION: &str = "A concise search query related to a chemical substance, its \
properties, environmental behavior, toxicity, or relevance to aquatic ecosystems. The query \
should be specific enough to retrieve relevant Wikipedia information.";

const DEFAULT_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const TOP_K_RESULTS: usize = 3;
const MAX_QUERY_CHARS: usize = 300;
const MAX_CONTENT_CHARS: usize = 4000;
pub const NO_RESULT: &str = "No good Wikipedia Search Result was found";

pub struct WikipediaTool {
    http: reqwest::Client,
    api_url: String,
}

impl WikipediaTool {
    pub fn new(context: &ToolContext) -> Self {
        Self {
            http: context.http.clone(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Point the tool at another MediaWiki installation
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    async fn api(&self, params: &[(&str, &str)]) -> Result<Value> {
        let response = self
            .http
            .get(&self.api_url)
            .query(&[("format", "json"), ("action", "query")])
            .query(params)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    async fn search(&self, query: &str) -> Result<Vec<String>> {
        let limit = TOP_K_RESULTS.to_string();
        let body = self
            .api(&[("list", "search"), ("srsearch", query), ("srlimit", &limit)])
            .await?;
        Ok(parse_titles(&body))
    }

    async fn summary(&self, title: &str) -> Result<Option<String>> {
        let body = self
            .api(&[
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title),
            ])
            .await?;
        Ok(parse_extract(&body))
    }

    async fn lookup(&self, query: &str) -> Result<String> {
        let query: String = query.chars().take(MAX_QUERY_CHARS).collect();
        let titles = self.search(&query).await?;
        tracing::debug!(query = %query, hits = titles.len(), "Wikipedia search");

        let mut pages = Vec::new();
        for title in titles {
            if let Some(summary) = self.summary(&title).await? {
                pages.push((title, summary));
            }
        }
        Ok(format_pages(&pages))
    }
}

fn parse_titles(body: &Value) -> Vec<String> {
    body.pointer("/query/search")
        .and_then(Value::as_array)
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("title").and_then(Value::as_str))
                .take(TOP_K_RESULTS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_extract(body: &Value) -> Option<String> {
    body.pointer("/query/pages")
        .and_then(Value::as_object)?
        .values()
        .filter_map(|page| page.get("extract").and_then(Value::as_str))
        .map(str::trim)
        .find(|extract| !extract.is_empty())
        .map(str::to_string)
}

fn format_pages(pages: &[(String, String)]) -> String {
    if pages.is_empty() {
        return NO_RESULT.to_string();
    }
    pages
        .iter()
        .map(|(title, summary)| format!("Page: {}\nSummary: {}", title, summary))
        .collect::<Vec<_>>()
        .join("\n\n")
        .chars()
        .take(MAX_CONTENT_CHARS)
        .collect()
}

#[async_trait]
impl Tool for WikipediaTool {
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
        let query = call.query()?;
        let content = self.lookup(&query).await?;
        Ok(ToolResult::success(call.id, content))
    }

    fn examples(&self) -> Vec<ToolExample> {
        vec![ToolExample::query(
            "Background on a substance",
            "Diuron herbicide toxicity",
        )]
    }
}

impl_tool_factory!(WikipediaToolFactory, WikipediaTool, NAME, DESCRIPTION);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_search_hits() {
        let body = json!({"query": {"search": [
            {"title": "Diuron"}, {"title": "Herbicide"}, {"title": "Urea"}, {"title": "Linuron"}
        ]}});
        assert_eq!(parse_titles(&body), vec!["Diuron", "Herbicide", "Urea"]);
        assert!(parse_titles(&json!({"batchcomplete": ""})).is_empty());
    }

    #[test]
    fn test_parse_extract() {
        let body = json!({"query": {"pages": {"123": {"title": "Diuron", "extract": " Diuron is an algicide. "}}}});
        assert_eq!(parse_extract(&body).as_deref(), Some("Diuron is an algicide."));

        let missing = json!({"query": {"pages": {"-1": {"title": "Nope", "missing": ""}}}});
        assert_eq!(parse_extract(&missing), None);
    }

    #[test]
    fn test_format_pages() {
        assert_eq!(format_pages(&[]), NO_RESULT);

        let pages = vec![
            ("Diuron".to_string(), "An algicide.".to_string()),
            ("Atrazine".to_string(), "A herbicide.".to_string()),
        ];
        assert_eq!(
            format_pages(&pages),
            "Page: Diuron\nSummary: An algicide.\n\nPage: Atrazine\nSummary: A herbicide."
        );

        let long = vec![("Long".to_string(), "x".repeat(10_000))];
        assert_eq!(format_pages(&long).chars().count(), MAX_CONTENT_CHARS);
    }
}
