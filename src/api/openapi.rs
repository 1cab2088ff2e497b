//! OpenAPI documentation and schema generation

use utoipa::OpenApi;

/// OpenAPI documentation for the voicenote-dl REST API
///
/// Served at `/openapi.json` and rendered at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "voicenote-dl REST API",
        version = "0.1.0",
        description = "Chat session control and paced bulk voice note retrieval",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:3001", description = "Local relay")
    ),
    paths(
        // Session
        crate::api::routes::get_status,
        crate::api::routes::get_qr,
        crate::api::routes::send_text,
        crate::api::routes::send_audio,

        // Bulk Retrieval
        crate::api::routes::download_voices,
        crate::api::routes::download_voices_all,
        crate::api::routes::download_progress,
        crate::api::routes::download_stop,

        // System
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        crate::types::ChatId,
        crate::types::MessageId,
        crate::types::ConnectionState,
        crate::types::MessageKind,
        crate::types::JobStatus,
        crate::types::JobScope,
        crate::types::Progress,
        crate::types::Event,
        crate::pacing::PacingRule,

        crate::config::Config,
        crate::config::SessionConfig,
        crate::config::ReconnectConfig,
        crate::config::RetrievalConfig,
        crate::config::PacingConfig,
        crate::config::DelayRange,
        crate::config::ServerIntegrationConfig,
        crate::config::ApiConfig,

        crate::api::routes::StatusResponse,
        crate::api::routes::QrResponse,
        crate::api::routes::SendTextRequest,
        crate::api::routes::SendAudioRequest,
        crate::api::routes::SendResponse,
        crate::api::routes::DownloadVoicesRequest,
        crate::api::routes::DownloadVoicesAllRequest,

        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "session", description = "Chat session - Connection status, pairing, sending messages"),
        (name = "retrieval", description = "Bulk retrieval - Paced voice note downloads and progress"),
        (name = "system", description = "System endpoints - Health checks, OpenAPI spec, events"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the X-Api-Key authentication scheme
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = &mut openapi.components {
            components.add_security_scheme(
                "api_key",
                utoipa::openapi::security::SecurityScheme::ApiKey(
                    utoipa::openapi::security::ApiKey::Header(
                        utoipa::openapi::security::ApiKeyValue::new("X-Api-Key"),
                    ),
                ),
            );
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_lists_every_route() {
        let spec = ApiDoc::openapi();
        for path in [
            "/status",
            "/qr",
            "/send-text",
            "/send-audio",
            "/download-voices",
            "/download-voices-all",
            "/download-progress",
            "/download-stop",
            "/health",
            "/events",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn spec_has_api_key_scheme() {
        let spec = ApiDoc::openapi();
        let components = spec.components.unwrap();
        assert!(components.security_schemes.contains_key("api_key"));
        assert!(components.schemas.contains_key("Progress"));
    }
}
