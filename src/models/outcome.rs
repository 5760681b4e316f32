//! Query outcome model.
//!
//! The uniform success shape produced by the executor, regardless of which
//! `CrudIntent` produced the statement. Constructed per call, never cached.

use schemars::JsonSchema;
use serde::Serialize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct QueryOutcome {
    /// Result rows as ordered key-value maps.
    pub rows: Vec<serde_json::Map<String, JsonValue>>,
    /// Returned row count for row-producing statements, affected row count
    /// otherwise.
    pub row_count: u64,
    /// Leading SQL keyword (command-tag prefix). Present for raw queries only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl QueryOutcome {
    /// First returned row, if any. Convenience for single-row operations.
    pub fn first_row(&self) -> Option<&serde_json::Map<String, JsonValue>> {
        self.rows.first()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.row_count == 0
    }
}
