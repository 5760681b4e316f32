//! Integration tests for the HTTP front end.
//!
//! The router is exercised directly with `tower::ServiceExt::oneshot`; no
//! live database is needed for the unconfigured and bad-request paths.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use pg_mcp_server::db::PoolManager;
use pg_mcp_server::http;
use pg_mcp_server::store::MemoryStore;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let manager = Arc::new(PoolManager::new(Arc::new(MemoryStore::default())));
    http::router(manager)
}

async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_status_reports_unconfigured() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/mcp/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["configured"], JsonValue::Bool(false));
    assert_eq!(body["status"], "not_configured");
    assert!(body.get("connection").is_none());
}

#[tokio::test]
async fn test_query_without_setup_returns_not_configured_envelope() {
    let response = app()
        .oneshot(post_json("/mcp/query", r#"{"query": "SELECT 1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("not configured")
    );
}

#[tokio::test]
async fn test_query_requires_query_field() {
    let response = app()
        .oneshot(post_json("/mcp/query", r#"{"params": []}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Query is required");
}

#[tokio::test]
async fn test_create_requires_table_and_data() {
    let response = app()
        .oneshot(post_json("/mcp/create", r#"{"table": "users"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Table name and data are required");
}

#[tokio::test]
async fn test_read_requires_table() {
    let response = app()
        .oneshot(post_json("/mcp/read", r#"{"conditions": {"id": 1}}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_requires_all_members() {
    let response = app()
        .oneshot(post_json(
            "/mcp/update",
            r#"{"table": "users", "data": {"name": "x"}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "Table name, data to update, and conditions are required"
    );
}

#[tokio::test]
async fn test_delete_requires_conditions_member() {
    let response = app()
        .oneshot(post_json("/mcp/delete", r#"{"table": "users"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Table name and conditions are required");
}

#[tokio::test]
async fn test_setup_requires_host_database_user() {
    let response = app()
        .oneshot(post_json(
            "/mcp/setup",
            r#"{"host": "localhost", "user": "app"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing required database configuration");
}

#[tokio::test]
async fn test_setup_against_unreachable_target_reports_connection_failure() {
    let response = app()
        .oneshot(post_json(
            "/mcp/setup",
            r#"{
                "host": "127.0.0.1",
                "port": 9,
                "database": "nope",
                "user": "nobody",
                "password": "secret-probe",
                "connectTimeoutMs": 500
            }"#,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Database connection failed");
    // Driver details surface, the secret never does.
    assert!(!body.to_string().contains("secret-probe"));
}

#[tokio::test]
async fn test_crud_after_failed_setup_still_not_configured() {
    let manager = Arc::new(PoolManager::new(Arc::new(MemoryStore::default())));

    let response = http::router(manager.clone())
        .oneshot(post_json(
            "/mcp/setup",
            r#"{"host": "127.0.0.1", "port": 9, "database": "d", "user": "u", "connectTimeoutMs": 500}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = http::router(manager)
        .oneshot(post_json("/mcp/read", r#"{"table": "users"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("not configured"));
}
