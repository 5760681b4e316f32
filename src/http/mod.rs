//! HTTP front end.
//!
//! A JSON API mirroring the MCP tool surface plus direct CRUD routes. Every
//! handler translates its body into a core contract call and wraps the
//! outcome in the `{success, data, rowCount}` / `{error, details}` envelopes.

pub mod routes;

use crate::db::PoolManager;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the API router.
pub fn router(manager: Arc<PoolManager>) -> Router {
    Router::new()
        .route("/mcp/setup", post(routes::setup))
        .route("/mcp/query", post(routes::query))
        .route("/mcp/create", post(routes::create))
        .route("/mcp/read", post(routes::read))
        .route("/mcp/update", post(routes::update))
        .route("/mcp/delete", post(routes::delete))
        .route("/mcp/status", get(routes::status))
        .layer(CorsLayer::permissive())
        .with_state(manager)
}
