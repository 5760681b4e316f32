//! Query execution.
//!
//! Runs built statements against a pool and normalizes driver results into a
//! uniform `QueryOutcome`, regardless of which intent produced the SQL. Rows
//! and affected counts are collected in one pass so INSERT/UPDATE/DELETE with
//! RETURNING and plain SELECTs flow through the same path.
//!
//! No retries, no executor-level timeout and no cancellation: the pool's own
//! connect/idle settings are the only limits applied.

use crate::db::manager::PoolManager;
use crate::db::statement::{self, Statement};
use crate::db::types::row_to_json;
use crate::error::{DbError, DbResult};
use crate::models::{CrudIntent, ParamValue, QueryOutcome};
use futures_util::TryStreamExt;
use sqlx::postgres::PgArguments;
use sqlx::{Either, PgPool, Postgres};
use tracing::debug;

/// Execute a built statement against the given pool.
pub async fn execute(pool: &PgPool, statement: &Statement) -> DbResult<QueryOutcome> {
    debug!(
        sql = %statement.sql,
        params = statement.params.len(),
        "Executing statement"
    );

    let mut query = sqlx::query(&statement.sql);
    for param in &statement.params {
        query = bind_param(query, param);
    }

    let mut rows = Vec::new();
    let mut rows_affected = 0u64;
    let mut stream = query.fetch_many(pool);
    while let Some(step) = stream.try_next().await.map_err(DbError::from)? {
        match step {
            Either::Left(result) => rows_affected += result.rows_affected(),
            Either::Right(row) => rows.push(row_to_json(&row)),
        }
    }

    let row_count = if rows.is_empty() {
        rows_affected
    } else {
        rows.len() as u64
    };

    Ok(QueryOutcome {
        rows,
        row_count,
        command: statement.command.clone(),
    })
}

/// The shared path for both front ends: resolve the active pool, build the
/// statement, run it.
///
/// The pool is resolved first so a call before any successful configure fails
/// with `NotConfigured` without any SQL being built or dispatched.
pub async fn dispatch(manager: &PoolManager, intent: CrudIntent) -> DbResult<QueryOutcome> {
    let operation = intent.operation();
    let pool = manager.pool().await?;
    let statement = statement::build(intent)?;

    let outcome = execute(&pool, &statement).await?;
    debug!(
        operation,
        row_count = outcome.row_count,
        "Statement completed"
    );
    Ok(outcome)
}

fn bind_param<'q>(
    query: sqlx::query::Query<'q, Postgres, PgArguments>,
    param: &'q ParamValue,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match param {
        ParamValue::Null => query.bind(None::<String>),
        ParamValue::Bool(v) => query.bind(*v),
        ParamValue::Int(v) => query.bind(*v),
        ParamValue::Float(v) => query.bind(*v),
        ParamValue::Text(v) => query.bind(v.as_str()),
        ParamValue::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}
