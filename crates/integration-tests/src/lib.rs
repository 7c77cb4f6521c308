//! Integration test helpers for Gadzilla.
//!
//! # Running Tests
//!
//! ```bash
//! # Router and checkout tests, no database needed
//! cargo test -p gadzilla-integration-tests
//!
//! # Also run the PostgreSQL tests against a scratch database
//! TEST_DATABASE_URL=postgres://localhost/gadzilla_test cargo test -p gadzilla-integration-tests
//! ```
//!
//! Router tests use a lazily connecting pool: requests that never reach the
//! database (validation failures, auth rejections, health) run without one.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use secrecy::SecretString;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;

use gadzilla_core::ShippingRates;
use gadzilla_storefront::config::StorefrontConfig;
use gadzilla_storefront::db;
use gadzilla_storefront::routes;
use gadzilla_storefront::state::AppState;

/// Admin path configured in [`test_config`].
pub const ADMIN_PATH: &str = "staff-portal-7f3a";

/// Config with email, Sentry and CORS origins off.
#[must_use]
pub fn test_config(database_url: &str) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from(database_url),
        host: "127.0.0.1".parse().unwrap(),
        port: 8000,
        base_url: "http://localhost:8000".to_owned(),
        media_base_url: "http://localhost:8000/media".to_owned(),
        cors_allowed_origins: vec!["http://localhost:5173".to_owned()],
        admin_url_path: Some(ADMIN_PATH.to_owned()),
        shipping: ShippingRates::default(),
        low_stock_threshold: 5,
        email: None,
        admin_email: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Router over a pool that never connects unless a handler queries it.
#[must_use]
pub fn lazy_app() -> Router {
    let url = "postgres://gadzilla@127.0.0.1:1/unreachable";
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy(url)
        .unwrap();
    routes::app(AppState::new(test_config(url), pool))
}

/// Scratch database from `TEST_DATABASE_URL`, migrated. `None` skips the test.
pub async fn test_database() -> Option<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let pool = db::create_pool(&SecretString::from(url)).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    Some(pool)
}

/// Send one request, returning status and JSON body (`Null` when empty or
/// not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[must_use]
pub fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
