//! Tabular answers: cropped rows, full-set statistics and the query itself

use super::describe::describe;
use crate::error::{QueryError, Result};
use crate::graph::Record;
use serde_json::Value;

/// Query result prepared for the tabular tool
#[derive(Debug, Clone)]
pub struct TableShape {
    /// Rows shown to the model
    pub rows: Vec<Record>,
    /// Number of rows the query returned
    pub total_rows: usize,
    /// Statistics over all returned rows
    pub summary: Value,
}

impl TableShape {
    /// Crop to `max_rows_shown` rows. An empty result is a [`QueryError::NoDataFound`].
    pub fn new(records: Vec<Record>, max_rows_shown: usize, query: &str) -> Result<Self> {
        if records.is_empty() {
            return Err(QueryError::NoDataFound {
                query: query.to_string(),
            }
            .into());
        }

        let summary = describe(&records);
        let total_rows = records.len();
        let mut rows = records;
        rows.truncate(max_rows_shown);

        Ok(Self {
            rows,
            total_rows,
            summary,
        })
    }

    pub fn is_cropped(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// Text handed back to the model
    pub fn to_content(&self, query: &str, data_source_link: &str) -> String {
        let heading = if self.is_cropped() {
            format!(
                "The full result of {} rows was cropped to {} rows:",
                self.total_rows,
                self.rows.len()
            )
        } else {
            format!("The results comprise {} rows:", self.total_rows)
        };

        let data = serde_json::to_string(&self.rows).unwrap_or_default();
        let summary = self.summary.to_string();

        format!(
            "{heading}\n\
             <data>\n{data}\n</data>\n\n\
             Provide the user with a Markdown formatted table of the data and a textual summary.\n\
             <summary>\n{summary}\n</summary>\n\n\
             Always provide the following cypher query as code to the user:\n\
             ```cypher\n{query}\n```\n\n\
             Always provide the link {data_source_link} to the full graph database where the user \
             can access the complete result with the cypher query."
        )
    }
}
