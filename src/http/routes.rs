//! HTTP route handlers.
//!
//! Request bodies use camelCase keys; missing required members are rejected
//! with 400 before the core is touched, matching the API this server has
//! always spoken.

use crate::db::{self, PoolManager};
use crate::error::DbError;
use crate::models::{
    ConnectionInfo, CrudIntent, DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_IDLE_TIMEOUT_MS,
    DEFAULT_MAX_POOL_SIZE, DEFAULT_PG_PORT, FieldMap, ParamValue, QueryOutcome, StatusReport,
};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

/// Error envelope for the HTTP API.
pub struct ApiError(DbError);

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self.0 {
            DbError::Validation { message } => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            DbError::NotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.0.to_string() }),
            ),
            DbError::Connection { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Database connection failed", "details": message }),
            ),
            DbError::Query { message, sql_state } => {
                let details = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Query execution failed", "details": details }),
                )
            }
            DbError::Persistence { message } | DbError::Internal { message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": message }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<JsonValue>, ApiError>;

fn bad_request(message: &str) -> ApiError {
    ApiError(DbError::validation(message))
}

fn rows_envelope(outcome: QueryOutcome) -> Json<JsonValue> {
    Json(json!({
        "success": true,
        "data": outcome.rows,
        "rowCount": outcome.row_count,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupBody {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    user: Option<String>,
    password: Option<String>,
    ssl: Option<bool>,
    max_pool_size: Option<u32>,
    idle_timeout_ms: Option<u64>,
    connect_timeout_ms: Option<u64>,
}

pub async fn setup(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<SetupBody>,
) -> ApiResult {
    let (Some(host), Some(database), Some(user)) = (body.host, body.database, body.user) else {
        return Err(bad_request("Missing required database configuration"));
    };

    let info = ConnectionInfo {
        host,
        port: body.port.unwrap_or(DEFAULT_PG_PORT),
        database,
        user,
        password: body.password,
        ssl: body.ssl.unwrap_or(false),
        max_pool_size: body.max_pool_size.unwrap_or(DEFAULT_MAX_POOL_SIZE),
        idle_timeout_ms: body.idle_timeout_ms.unwrap_or(DEFAULT_IDLE_TIMEOUT_MS),
        connect_timeout_ms: body.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
    };

    let connection = manager.configure(info).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Database setup completed successfully",
        "connection": connection,
    })))
}

#[derive(Debug, Deserialize)]
pub struct QueryBody {
    query: Option<String>,
    #[serde(default)]
    params: Vec<ParamValue>,
}

pub async fn query(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<QueryBody>,
) -> ApiResult {
    let Some(sql) = body.query else {
        return Err(bad_request("Query is required"));
    };

    let outcome = db::dispatch(
        &manager,
        CrudIntent::RawQuery {
            sql,
            params: body.params,
        },
    )
    .await?;
    Ok(rows_envelope(outcome))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
    table: Option<String>,
    data: Option<FieldMap>,
}

pub async fn create(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<CreateBody>,
) -> ApiResult {
    let (Some(table), Some(fields)) = (body.table, body.data) else {
        return Err(bad_request("Table name and data are required"));
    };

    let outcome = db::dispatch(&manager, CrudIntent::Create { table, fields }).await?;
    Ok(Json(json!({
        "success": true,
        "data": outcome.first_row(),
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadBody {
    table: Option<String>,
    #[serde(default)]
    conditions: FieldMap,
    order_by: Option<String>,
    limit: Option<u64>,
    offset: Option<u64>,
}

pub async fn read(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<ReadBody>,
) -> ApiResult {
    let Some(table) = body.table else {
        return Err(bad_request("Table name is required"));
    };

    let outcome = db::dispatch(
        &manager,
        CrudIntent::Read {
            table,
            conditions: body.conditions,
            order_by: body.order_by,
            limit: body.limit,
            offset: body.offset,
        },
    )
    .await?;
    Ok(rows_envelope(outcome))
}

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
    table: Option<String>,
    data: Option<FieldMap>,
    conditions: Option<FieldMap>,
}

pub async fn update(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<UpdateBody>,
) -> ApiResult {
    let (Some(table), Some(fields), Some(conditions)) = (body.table, body.data, body.conditions)
    else {
        return Err(bad_request(
            "Table name, data to update, and conditions are required",
        ));
    };

    let outcome = db::dispatch(
        &manager,
        CrudIntent::Update {
            table,
            fields,
            conditions,
        },
    )
    .await?;
    Ok(rows_envelope(outcome))
}

#[derive(Debug, Deserialize)]
pub struct DeleteBody {
    table: Option<String>,
    conditions: Option<FieldMap>,
}

pub async fn delete(
    State(manager): State<Arc<PoolManager>>,
    Json(body): Json<DeleteBody>,
) -> ApiResult {
    let (Some(table), Some(conditions)) = (body.table, body.conditions) else {
        return Err(bad_request("Table name and conditions are required"));
    };

    let outcome = db::dispatch(&manager, CrudIntent::Delete { table, conditions }).await?;
    Ok(rows_envelope(outcome))
}

pub async fn status(State(manager): State<Arc<PoolManager>>) -> Json<StatusReport> {
    Json(manager.status().await)
}
