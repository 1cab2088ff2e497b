use super::*;
use crate::test_helpers::{FakeSession, connected_relay};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

mod system;

/// Router around a connected relay
async fn connected_app(config: Config) -> (Router, Arc<VoiceRelay>, Arc<FakeSession>) {
    let (relay, session) = connected_relay(config).await;
    let relay = Arc::new(relay);
    let app = create_router(relay.clone(), relay.config());
    (app, relay, session)
}

/// Router around a relay that was never started
fn idle_app(config: Config) -> (Router, Arc<VoiceRelay>) {
    let relay = Arc::new(VoiceRelay::new(config, FakeSession::new()).unwrap());
    let app = create_router(relay.clone(), relay.config());
    (app, relay)
}

async fn get(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn post_empty(app: &Router, uri: &str) -> Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn api_server_spawns() {
    let mut config = Config::default();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let relay = Arc::new(VoiceRelay::new(config, FakeSession::new()).unwrap());

    let handle = relay.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!handle.is_finished(), "server should keep running");
    handle.abort();
}

#[tokio::test]
async fn cors_allows_any_origin_by_default() {
    let (app, _relay) = idle_app(Config::default());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

#[tokio::test]
async fn cors_can_be_disabled() {
    let mut config = Config::default();
    config.server.api.cors_enabled = false;
    let (app, _relay) = idle_app(config);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(
        response
            .headers()
            .get("access-control-allow-origin")
            .is_none()
    );
}

#[tokio::test]
async fn api_key_is_enforced_when_configured() {
    let mut config = Config::default();
    config.server.api.api_key = Some("relay-secret".to_string());
    let (app, _relay) = idle_app(config);

    let response = get(&app, "/status").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/status")
                .header("X-Api-Key", "relay-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn swagger_ui_can_be_disabled() {
    let (app, _relay) = idle_app(Config::default());
    let response = get(&app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut config = Config::default();
    config.server.api.swagger_ui = false;
    let (app, _relay) = idle_app(config);
    let response = get(&app, "/swagger-ui/").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
