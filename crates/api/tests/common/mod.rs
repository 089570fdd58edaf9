#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use herald_api::config::{ServerConfig, StoreBackend};
use herald_api::middleware::auth::USER_ID_HEADER;
use herald_api::router::build_app_router;
use herald_api::state::AppState;
use herald_db::MemoryNotificationStore;
use herald_events::{NotificationHub, NotificationService};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

/// Build a test `ServerConfig` with safe defaults and the in-memory store.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        store_backend: StoreBackend::Memory,
        database_url: None,
        queue_capacity: 8,
        sweep_interval_secs: 900,
        ws_ping_interval_secs: 30,
    }
}

/// A router plus a handle on the service behind it, so tests can subscribe
/// to live feeds or seed data without going through HTTP.
pub struct TestApp {
    pub router: Router,
    pub notifications: Arc<NotificationService>,
}

/// Build the full application router over a fresh in-memory store.
///
/// Uses the same [`build_app_router`] as `main.rs`, so tests exercise the
/// production middleware stack.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let notifications = Arc::new(NotificationService::new(
        Arc::new(MemoryNotificationStore::new()),
        Arc::new(NotificationHub::with_capacity(config.queue_capacity)),
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        notifications: Arc::clone(&notifications),
        pool: None,
    };

    TestApp {
        router: build_app_router(state, &config),
        notifications,
    }
}

/// Send a request, optionally as `user` and with a JSON body.
pub async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    user: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str, user: Option<&str>) -> Response<Body> {
    send(app, Method::GET, uri, user, None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a notification for `recipient` over HTTP and return its id.
pub async fn create_for(app: &TestApp, recipient: &str, title: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/notifications",
        serde_json::json!({
            "recipient_id": recipient,
            "type": "task_assigned",
            "title": title,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"]
        .as_str()
        .unwrap()
        .to_string()
}
