//! Neo4j client over the HTTP transactional endpoint

use super::{GraphStore, Record};
use crate::config::GraphStoreConfig;
use crate::error::{Error, GraphError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const SECURITY_ERROR_PREFIX: &str = "Neo.ClientError.Security";

/// Neo4j store speaking `POST {uri}/db/{database}/tx/commit`.
///
/// Build it with [`connect`](Self::connect) to check connectivity once up
/// front. Each `run` is then a single request. The underlying HTTP client
/// pools connections, so one store can be shared across sessions.
pub struct Neo4jHttpStore {
    client: Client,
    config: GraphStoreConfig,
}

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Statement<'a> {
    statement: &'a str,
    result_data_contents: [&'static str; 1],
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<Neo4jError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Neo4jError {
    code: String,
    message: String,
}

impl Neo4jHttpStore {
    pub fn new(config: GraphStoreConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|message| GraphError::Connection { message })?;

        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    /// Create a store and check that the server accepts our credentials
    pub async fn connect(config: GraphStoreConfig) -> Result<Self> {
        let store = Self::new(config)?;
        store.verify().await?;
        Ok(store)
    }

    /// Run a trivial statement; any failure is a connection error
    async fn verify(&self) -> Result<()> {
        self.commit("RETURN 1").await.map_err(|e| match e {
            Error::Graph(GraphError::Query { code, message }) => GraphError::Connection {
                message: format!("{}: {}", code, message),
            }
            .into(),
            other => other,
        })?;
        tracing::info!(uri = %self.config.uri, database = %self.config.database, "Connected to Neo4j");
        Ok(())
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/db/{}/tx/commit",
            self.config.uri.trim_end_matches('/'),
            self.config.database
        )
    }

    async fn commit(&self, query: &str) -> Result<Vec<Record>> {
        let request = CommitRequest {
            statements: vec![Statement {
                statement: query,
                result_data_contents: ["row"],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header("Accept", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| GraphError::Connection {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(GraphError::Connection {
                message: format!("authentication failed ({})", status),
            }
            .into());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Connection {
                message: format!("{}: {}", status, body),
            }
            .into());
        }

        let body: CommitResponse = response.json().await.map_err(|e| GraphError::Connection {
            message: format!("Failed to parse response: {}", e),
        })?;

        parse_commit_response(body)
    }
}

fn parse_commit_response(body: CommitResponse) -> Result<Vec<Record>> {
    if let Some(error) = body.errors.into_iter().next() {
        if error.code.starts_with(SECURITY_ERROR_PREFIX) {
            return Err(GraphError::Connection {
                message: error.message,
            }
            .into());
        }
        return Err(GraphError::Query {
            code: error.code,
            message: error.message,
        }
        .into());
    }

    let Some(result) = body.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    Ok(result
        .data
        .into_iter()
        .map(|data| {
            result
                .columns
                .iter()
                .cloned()
                .zip(data.row)
                .collect::<Record>()
        })
        .collect())
}

#[async_trait]
impl GraphStore for Neo4jHttpStore {
    async fn run(&self, query: &str, limit: usize) -> Result<Vec<Record>> {
        let mut records = self.commit(query).await?;
        if records.len() > limit {
            tracing::debug!(total = records.len(), limit, "Truncating graph result");
            records.truncate(limit);
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("neo4j {} ({})", self.config.uri, self.config.database)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers every request with `body` and counts the requests it served
    async fn serve(body: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut received = Vec::new();
                let mut buf = [0u8; 4096];
                // read headers, then the announced body
                loop {
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    if n == 0 {
                        break;
                    }
                    received.extend_from_slice(&buf[..n]);
                    let text = String::from_utf8_lossy(&received);
                    if let Some(end) = text.find("\r\n\r\n") {
                        let length = text[..end]
                            .lines()
                            .find_map(|line| {
                                let (name, value) = line.split_once(':')?;
                                name.eq_ignore_ascii_case("content-length")
                                    .then(|| value.trim().parse::<usize>().ok())
                                    .flatten()
                            })
                            .unwrap_or(0);
                        if received.len() >= end + 4 + length {
                            break;
                        }
                    }
                }
                counter.fetch_add(1, Ordering::SeqCst);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (uri, requests)
    }

    fn config(uri: String) -> GraphStoreConfig {
        GraphStoreConfig::new(uri, "neo4j".to_string(), "secret".to_string())
    }

    fn parse(value: Value) -> Result<Vec<Record>> {
        parse_commit_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_parse_rows_in_column_order() {
        let records = parse(json!({
            "results": [{
                "columns": ["SiteName", "Lat", "Lon"],
                "data": [
                    {"row": ["Elbe Schnackenburg", 53.04, 11.57], "meta": [null, null, null]},
                    {"row": ["Rhine Lobith", 51.85, 6.1], "meta": [null, null, null]}
                ]
            }],
            "errors": []
        }))
        .unwrap();

        assert_eq!(records.len(), 2);
        let keys: Vec<&String> = records[0].keys().collect();
        assert_eq!(keys, vec!["SiteName", "Lat", "Lon"]);
        assert_eq!(records[1]["SiteName"], json!("Rhine Lobith"));
    }

    #[test]
    fn test_zero_rows_is_ok() {
        let records = parse(json!({"results": [{"columns": ["n"], "data": []}], "errors": []})).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_error_classification() {
        let err = parse(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "Invalid input 'X'"}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::Query { .. })));
        assert!(err.is_recoverable());

        let err = parse(json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Security.Unauthorized", "message": "bad credentials"}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Graph(GraphError::Connection { .. })));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_endpoint() {
        let store = Neo4jHttpStore::new(
            GraphStoreConfig::new(
                "http://localhost:7474/".to_string(),
                "neo4j".to_string(),
                "secret".to_string(),
            )
            .with_database("ecotox".to_string()),
        )
        .unwrap();
        assert_eq!(store.endpoint(), "http://localhost:7474/db/ecotox/tx/commit");
    }

    #[test]
    fn test_invalid_config_is_a_connection_error() {
        let err = Neo4jHttpStore::new(GraphStoreConfig::new(
            "bolt://localhost:7687".to_string(),
            "neo4j".to_string(),
            "secret".to_string(),
        ))
        .err()
        .unwrap();
        assert!(matches!(err, Error::Graph(GraphError::Connection { .. })));
    }

    #[tokio::test]
    async fn test_run_is_a_single_request() {
        let (uri, requests) =
            serve(r#"{"results":[{"columns":["n"],"data":[{"row":[1]},{"row":[2]}]}],"errors":[]}"#).await;
        let store = Neo4jHttpStore::new(config(uri)).unwrap();

        let records = store.run("MATCH (n) RETURN n", 1).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        store.run("MATCH (n) RETURN n", 10).await.unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connect_verifies_once_up_front() {
        let (uri, requests) = serve(r#"{"results":[{"columns":["1"],"data":[{"row":[1]}]}],"errors":[]}"#).await;

        let store = Neo4jHttpStore::connect(config(uri)).await.unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 1);

        store.run("RETURN 1", 5).await.unwrap();
        assert_eq!(requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_connect_turns_rejected_check_into_connection_error() {
        let (uri, _) = serve(
            r#"{"results":[],"errors":[{"code":"Neo.ClientError.Database.DatabaseNotFound","message":"no such database"}]}"#,
        )
        .await;

        let err = Neo4jHttpStore::connect(config(uri)).await.err().unwrap();
        assert!(matches!(err, Error::Graph(GraphError::Connection { .. })));
        assert!(!err.is_recoverable());
    }
}
