//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use eventide_event_bus::InMemoryEventBus;
use eventide_event_store::pg_event_repository::PgEventRepository;
use eventide_test_support::FixedClock;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use eventide_api::routes;
use eventide_api::state::AppState;
use eventide_api::subscribers;

/// Build the full app router with a real `PgEventRepository`, an in-memory
/// bus carrying the default subscribers and a fixed clock. Uses the same
/// route structure as `main.rs`.
pub fn build_test_app(pool: PgPool) -> Router {
    let event_repository = Arc::new(PgEventRepository::new(pool));
    let event_bus = Arc::new(InMemoryEventBus::new());
    subscribers::register_default_subscribers(&event_bus);
    let app_state = AppState::new(
        Arc::new(FixedClock::default_instant()),
        event_repository,
        event_bus,
        Duration::from_secs(5),
    )
    .with_event_store_name("postgres");

    routes::app(app_state)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}
