use super::*;

#[tokio::test]
async fn health_reports_session_and_job() {
    let (app, _relay) = idle_app(Config::default());

    let response = get(&app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["session"], "disconnected");
    assert_eq!(body["job"], "idle");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _relay) = idle_app(Config::default());

    let response = get(&app, "/openapi.json").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert!(body["paths"]["/download-voices"].is_object());
    assert_eq!(body["info"]["title"], "voicenote-dl REST API");
}

#[tokio::test]
async fn events_endpoint_streams_sse() {
    let (app, relay) = idle_app(Config::default());

    let response = get(&app, "/events").await;
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    assert!(content_type.contains("text/event-stream"));

    // The handler subscribed; a relay event now has a receiver
    assert!(relay.event_tx.receiver_count() >= 1);
}
