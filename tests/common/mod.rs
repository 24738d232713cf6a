//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use tower::util::ServiceExt;

use congregation_api::api::middleware::hash_api_key;
use congregation_api::store::InMemoryDocumentStore;
use congregation_api::{build_router, AppState};

pub const TEST_API_KEY: &str = "test_key_123";

/// Caller presented through the X-User-* headers
#[derive(Debug, Clone, Copy)]
pub enum Caller<'a> {
    Anonymous,
    Member(&'a str),
    Admin,
}

/// Router over a fresh in-memory store, API key enforced
pub fn test_app() -> Router {
    let state = AppState::new(Arc::new(InMemoryDocumentStore::new()))
        .with_api_key_hash(hash_api_key(TEST_API_KEY));
    build_router(state)
}

/// Send one request and decode the JSON body (`Null` when empty)
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    caller: Caller<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", TEST_API_KEY);

    request = match caller {
        Caller::Anonymous => request,
        Caller::Member(user_id) => request
            .header("X-User-Id", user_id)
            .header("X-User-Name", format!("Member {user_id}")),
        Caller::Admin => request
            .header("X-User-Id", "admin-1")
            .header("X-User-Name", "Pastor Ade")
            .header("X-User-Role", "admin"),
    };

    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

/// Setup test database - truncate the documents table
pub async fn setup_test_db() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to DB");

    // Multi-statement script; goes through the simple query protocol
    pool.execute(include_str!("../../migrations/0001_documents.sql"))
        .await
        .expect("Failed to apply schema");

    sqlx::query("TRUNCATE TABLE documents")
        .execute(&pool)
        .await
        .expect("Failed to clean up DB");

    pool
}
