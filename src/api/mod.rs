//! REST API server module
//!
//! Exposes the session and bulk retrieval controls over HTTP, plus an
//! OpenAPI description and a server-sent events stream.

use crate::{Config, Result, VoiceRelay};
use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod auth;
pub mod error_response;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use state::AppState;

/// Create the API router with all route definitions
///
/// # Routes
///
/// ## Session
/// - `GET /status` - Connection state and reconnect attempts
/// - `GET /qr` - Pairing code to scan (null unless pairing)
/// - `POST /send-text` - Send a text message
/// - `POST /send-audio` - Send an audio file as a voice note
///
/// ## Bulk Retrieval
/// - `POST /download-voices` - Download the voice notes of one chat
/// - `POST /download-voices-all` - Download the voice notes of every chat
/// - `GET /download-progress` - Progress of the current or last job
/// - `POST /download-stop` - Stop the running job
///
/// ## System
/// - `GET /health` - Health check
/// - `GET /openapi.json` - OpenAPI specification
/// - `GET /swagger-ui` - Interactive Swagger UI documentation (if enabled)
/// - `GET /events` - Server-sent events stream
pub fn create_router(relay: Arc<VoiceRelay>, config: Arc<Config>) -> Router {
    let state = AppState::new(relay);

    let router = Router::new()
        // Session
        .route("/status", get(routes::get_status))
        .route("/qr", get(routes::get_qr))
        .route("/send-text", post(routes::send_text))
        .route("/send-audio", post(routes::send_audio))
        // Bulk Retrieval
        .route("/download-voices", post(routes::download_voices))
        .route("/download-voices-all", post(routes::download_voices_all))
        .route("/download-progress", get(routes::download_progress))
        .route("/download-stop", post(routes::download_stop))
        // System
        .route("/health", get(routes::health_check))
        .route("/openapi.json", get(routes::openapi_spec))
        .route("/events", get(routes::event_stream));

    // SwaggerUi serves its own copy of the document; /openapi.json is already routed
    let router = if config.server.api.swagger_ui {
        router.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        router
    };

    let router = router.with_state(state);

    let router = if config.server.api.api_key.is_some() {
        router.layer(middleware::from_fn_with_state(
            config.server.api.api_key.clone(),
            auth::require_api_key,
        ))
    } else {
        router
    };

    let router = router.layer(TraceLayer::new_for_http());

    if config.server.api.cors_enabled {
        let cors = build_cors_layer(&config.server.api.cors_origins);
        router.layer(cors)
    } else {
        router
    }
}

/// Build a CORS layer based on configured origins (`"*"` allows any origin)
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_any = origins.iter().any(|o| o == "*");

    if allow_any || origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(allowed))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Start the API server on the configured bind address.
///
/// Runs until the listener fails.
///
/// # Example
///
/// ```no_run
/// use voicenote_dl::{Config, VoiceRelay};
/// use voicenote_dl::session::ChatSession;
/// use std::sync::Arc;
///
/// # async fn example(client: Arc<dyn ChatSession>) -> Result<(), Box<dyn std::error::Error>> {
/// let config = Arc::new(Config::default());
/// let relay = Arc::new(VoiceRelay::new((*config).clone(), client)?);
///
/// // Blocks until the server stops
/// voicenote_dl::api::start_api_server(relay, config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_api_server(relay: Arc<VoiceRelay>, config: Arc<Config>) -> Result<()> {
    let bind_address = config.server.api.bind_address;

    tracing::info!(address = %bind_address, "Starting API server");

    let app = create_router(relay, config);

    let listener = TcpListener::bind(bind_address)
        .await
        .map_err(crate::error::Error::Io)?;

    tracing::info!(address = %bind_address, "API server listening");

    axum::serve(listener, app)
        .await
        .map_err(|e| crate::error::Error::ApiServerError(e.to_string()))?;

    tracing::info!("API server stopped");
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
