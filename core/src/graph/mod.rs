//! Graph store boundary
//!
//! Query tools hand a generated Cypher statement to a [`GraphStore`] and get
//! back ordered records mapping column names to values.

pub mod memory;
pub mod neo4j;

pub use memory::MemoryGraphStore;
pub use neo4j::Neo4jHttpStore;

use crate::error::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// One result row. Column order follows the query's RETURN clause.
pub type Record = Map<String, Value>;

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a read query and return at most `limit` records.
    ///
    /// An empty result is `Ok(vec![])`, never an error.
    async fn run(&self, query: &str, limit: usize) -> Result<Vec<Record>>;

    /// Short description of the backing store for logs
    fn describe(&self) -> String;
}

/// Column names of a result set in first-seen order
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_keep_first_seen_order() {
        let records: Vec<Record> = vec![
            json!({"SiteName": "A", "Lat": 1.0}).as_object().cloned().unwrap(),
            json!({"SiteName": "B", "Lat": 2.0, "Lon": 3.0}).as_object().cloned().unwrap(),
        ];
        assert_eq!(columns(&records), vec!["SiteName", "Lat", "Lon"]);
        assert!(columns(&[]).is_empty());
    }
}
