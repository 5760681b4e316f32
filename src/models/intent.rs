//! CRUD intent and parameter value models.
//!
//! A `CrudIntent` is the structured description of a request before any SQL
//! exists. Field and condition maps keep caller insertion order (serde_json
//! `preserve_order`), which the statement builder relies on for placeholder
//! numbering.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A value bound to a positional placeholder.
///
/// Values are always bound out-of-band, never interpolated into SQL text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ParamValue {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Text(String),
    /// Arbitrary JSON (arrays and objects), bound as json/jsonb
    Json(JsonValue),
}

impl ParamValue {
    /// Type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Json(_) => "json",
        }
    }
}

impl From<JsonValue> for ParamValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::Text(s),
            other => Self::Json(other),
        }
    }
}

/// Ordered column/value map, as received from a front end.
pub type FieldMap = serde_json::Map<String, JsonValue>;

/// A structured create/read/update/delete or raw-query request, prior to SQL
/// generation.
#[derive(Debug, Clone)]
pub enum CrudIntent {
    /// Pass-through SQL with positional params.
    RawQuery { sql: String, params: Vec<ParamValue> },
    /// Insert one row built from `fields`.
    Create { table: String, fields: FieldMap },
    /// Select rows matching `conditions` (all must hold).
    Read {
        table: String,
        conditions: FieldMap,
        order_by: Option<String>,
        limit: Option<u64>,
        offset: Option<u64>,
    },
    /// Update rows matching `conditions` with `fields`.
    Update {
        table: String,
        fields: FieldMap,
        conditions: FieldMap,
    },
    /// Delete rows matching `conditions`.
    Delete { table: String, conditions: FieldMap },
}

impl CrudIntent {
    /// Short operation name for logging.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::RawQuery { .. } => "query",
            Self::Create { .. } => "create",
            Self::Read { .. } => "read",
            Self::Update { .. } => "update",
            Self::Delete { .. } => "delete",
        }
    }
}
