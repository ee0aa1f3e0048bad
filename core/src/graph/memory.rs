//! In-process graph store returning canned records

use super::{GraphStore, Record};
use crate::error::{GraphError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

/// Store that answers every query with the same records and remembers the
/// queries it was asked to run. Useful for exercising the query tools
/// without a database.
#[derive(Debug, Default)]
pub struct MemoryGraphStore {
    records: Vec<Record>,
    failure: Option<GraphError>,
    executed: Mutex<Vec<String>>,
}

impl MemoryGraphStore {
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Default::default()
        }
    }

    /// Build from JSON objects; anything that is not an object is skipped
    pub fn from_json(rows: Vec<Value>) -> Self {
        Self::new(
            rows.into_iter()
                .filter_map(|row| match row {
                    Value::Object(record) => Some(record),
                    _ => None,
                })
                .collect(),
        )
    }

    /// Make every query fail with `failure`
    pub fn failing(failure: GraphError) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    /// Queries run so far, oldest first
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|queries| queries.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for MemoryGraphStore {
    async fn run(&self, query: &str, limit: usize) -> Result<Vec<Record>> {
        if let Ok(mut executed) = self.executed.lock() {
            executed.push(query.to_string());
        }

        match &self.failure {
            Some(GraphError::Connection { message }) => Err(GraphError::Connection {
                message: message.clone(),
            }
            .into()),
            Some(GraphError::Query { code, message }) => Err(GraphError::Query {
                code: code.clone(),
                message: message.clone(),
            }
            .into()),
            None => Ok(self.records.iter().take(limit).cloned().collect()),
        }
    }

    fn describe(&self) -> String {
        format!("in-memory store with {} records", self.records.len())
    }
}
