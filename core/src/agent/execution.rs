//! Agent execution result structures

use crate::shaping::Figure;
use serde::{Deserialize, Serialize};

/// Result of one conversational turn
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Whether the turn produced an answer
    pub success: bool,

    /// Final answer, or the failure description
    pub final_result: String,

    /// Number of model round trips
    pub steps_executed: usize,

    /// Total execution time in milliseconds
    pub duration_ms: u64,

    /// Charts produced by tools during the turn, in call order
    #[serde(default)]
    pub artifacts: Vec<Figure>,
}

impl AgentExecution {
    /// Create a successful execution result
    pub fn success(final_result: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            success: true,
            final_result,
            steps_executed,
            duration_ms,
            artifacts: Vec::new(),
        }
    }

    /// Create a failed execution result
    pub fn failure(error: String, steps_executed: usize, duration_ms: u64) -> Self {
        Self {
            success: false,
            final_result: format!("Execution failed: {}", error),
            steps_executed,
            duration_ms,
            artifacts: Vec::new(),
        }
    }

    /// Attach the charts of the turn
    pub fn with_artifacts(mut self, artifacts: Vec<Figure>) -> Self {
        self.artifacts = artifacts;
        self
    }
}
