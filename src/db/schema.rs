//! Schema introspection probes.
//!
//! Table discovery for the `list_tables` and `describe_table` tools, scoped
//! to the `public` schema. The table name in `describe_table` is bound as a
//! parameter, never spliced into the SQL text.

use crate::error::{DbError, DbResult};
use schemars::JsonSchema;
use serde::Serialize;
use sqlx::{PgPool, Row};

/// One column of a described table.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Names of all tables in the public schema, sorted.
pub async fn list_tables(pool: &PgPool) -> DbResult<Vec<String>> {
    let rows = sqlx::query(
        "SELECT table_name \
         FROM information_schema.tables \
         WHERE table_schema = 'public' \
         ORDER BY table_name",
    )
    .fetch_all(pool)
    .await
    .map_err(DbError::from)?;

    rows.iter()
        .map(|row| row.try_get::<String, _>("table_name").map_err(DbError::from))
        .collect()
}

/// Column definitions for one table in the public schema, in ordinal order.
pub async fn describe_table(pool: &PgPool, table: &str) -> DbResult<Vec<ColumnInfo>> {
    if table.trim().is_empty() {
        return Err(DbError::validation("Table name must not be empty"));
    }

    let rows = sqlx::query(
        "SELECT column_name, data_type, is_nullable, column_default \
         FROM information_schema.columns \
         WHERE table_schema = 'public' AND table_name = $1 \
         ORDER BY ordinal_position",
    )
    .bind(table)
    .fetch_all(pool)
    .await
    .map_err(DbError::from)?;

    rows.iter()
        .map(|row| {
            Ok(ColumnInfo {
                name: row.try_get("column_name").map_err(DbError::from)?,
                data_type: row.try_get("data_type").map_err(DbError::from)?,
                nullable: row
                    .try_get::<String, _>("is_nullable")
                    .map_err(DbError::from)?
                    .eq_ignore_ascii_case("yes"),
                default: row.try_get("column_default").map_err(DbError::from)?,
            })
        })
        .collect()
}
