//! Configuration types for voicenote-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Main configuration for [`VoiceRelay`](crate::VoiceRelay)
///
/// Fields are organized into sub-configs:
/// - [`session`](SessionConfig) - reconnect backoff and target normalization
/// - [`retrieval`](RetrievalConfig) - pacing, limits, voice item selection
/// - [`server`](ServerIntegrationConfig) - REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Chat session settings
    #[serde(default)]
    pub session: SessionConfig,

    /// Bulk retrieval settings
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// API and external server integration
    #[serde(default)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Check cross-field constraints that serde defaults cannot express
    pub fn validate(&self) -> Result<()> {
        let reconnect = &self.session.reconnect;
        if reconnect.base_delay.is_zero() {
            return Err(Error::Config {
                message: "reconnect base delay must be greater than zero".to_string(),
                key: Some("session.reconnect.base_delay".to_string()),
            });
        }
        if reconnect.max_delay < reconnect.base_delay {
            return Err(Error::Config {
                message: "reconnect max delay must not be below the base delay".to_string(),
                key: Some("session.reconnect.max_delay".to_string()),
            });
        }

        let pacing = &self.retrieval.pacing;
        for (key, range) in [
            ("retrieval.pacing.base", pacing.base),
            ("retrieval.pacing.micro_pause", pacing.micro_pause),
            ("retrieval.pacing.long_break", pacing.long_break),
            ("retrieval.pacing.between_chats", pacing.between_chats),
        ] {
            if range.min_ms > range.max_ms {
                return Err(Error::Config {
                    message: format!(
                        "delay range minimum {} exceeds maximum {}",
                        range.min_ms, range.max_ms
                    ),
                    key: Some(key.to_string()),
                });
            }
        }

        if self.retrieval.default_limit == 0 {
            return Err(Error::Config {
                message: "default history limit must be greater than zero".to_string(),
                key: Some("retrieval.default_limit".to_string()),
            });
        }

        Ok(())
    }
}

/// Chat session configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionConfig {
    /// Reconnect backoff after unexpected closes
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Server suffix appended to bare phone numbers (default: "s.whatsapp.net")
    #[serde(default = "default_user_server")]
    pub user_server: String,

    /// Capacity of the inbound message broadcast channel (default: 256)
    #[serde(default = "default_inbound_buffer")]
    pub inbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reconnect: ReconnectConfig::default(),
            user_server: default_user_server(),
            inbound_buffer: default_inbound_buffer(),
        }
    }
}

/// Reconnect backoff configuration
///
/// The delay before attempt `n` is `min(base_delay * 2^(n-1), max_delay)`.
/// Attempts continue indefinitely for transient closes.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect attempt (default: 5000 ms)
    #[serde(default = "default_base_delay", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub base_delay: Duration,

    /// Upper bound for the delay (default: 60000 ms)
    #[serde(default = "default_max_delay", with = "duration_ms_serde")]
    #[schema(value_type = u64)]
    pub max_delay: Duration,

    /// Add random jitter on top of the computed delay (default: false)
    #[serde(default)]
    pub jitter: bool,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay: default_base_delay(),
            max_delay: default_max_delay(),
            jitter: false,
        }
    }
}

/// Inclusive delay range in milliseconds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DelayRange {
    /// Lower bound (ms)
    pub min_ms: u64,
    /// Upper bound (ms)
    pub max_ms: u64,
}

impl DelayRange {
    /// Create a range from bounds in milliseconds
    pub const fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// Range that always yields zero
    pub const fn zero() -> Self {
        Self::from_millis(0, 0)
    }
}

/// Pacing ranges applied between downloads
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PacingConfig {
    /// Between consecutive items (default: 500-2000 ms)
    #[serde(default = "default_base_range")]
    pub base: DelayRange,

    /// After every 5th item (default: 1000-3000 ms)
    #[serde(default = "default_micro_pause_range")]
    pub micro_pause: DelayRange,

    /// After every 20th item (default: 5000-10000 ms)
    #[serde(default = "default_long_break_range")]
    pub long_break: DelayRange,

    /// Between chats in all-chats scope (default: 3000-8000 ms)
    #[serde(default = "default_between_chats_range")]
    pub between_chats: DelayRange,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            base: default_base_range(),
            micro_pause: default_micro_pause_range(),
            long_break: default_long_break_range(),
            between_chats: default_between_chats_range(),
        }
    }
}

/// Bulk retrieval configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetrievalConfig {
    /// Pacing ranges
    #[serde(default)]
    pub pacing: PacingConfig,

    /// History limit used when a request omits one (default: 1000)
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,

    /// Output directory used when a request omits one (default: "./voices")
    #[serde(default = "default_output_dir")]
    #[schema(value_type = String)]
    pub default_output_dir: PathBuf,

    /// Also retrieve audio attachments that were not recorded as voice notes (default: false)
    #[serde(default)]
    pub include_audio_files: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            pacing: PacingConfig::default(),
            default_limit: default_history_limit(),
            default_output_dir: default_output_dir(),
            include_audio_files: false,
        }
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:3001)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_user_server() -> String {
    "s.whatsapp.net".to_string()
}

fn default_inbound_buffer() -> usize {
    256
}

fn default_base_delay() -> Duration {
    Duration::from_millis(5_000)
}

fn default_max_delay() -> Duration {
    Duration::from_millis(60_000)
}

fn default_base_range() -> DelayRange {
    DelayRange::from_millis(500, 2_000)
}

fn default_micro_pause_range() -> DelayRange {
    DelayRange::from_millis(1_000, 3_000)
}

fn default_long_break_range() -> DelayRange {
    DelayRange::from_millis(5_000, 10_000)
}

fn default_between_chats_range() -> DelayRange {
    DelayRange::from_millis(3_000, 8_000)
}

fn default_history_limit() -> usize {
    1_000
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./voices")
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3001))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Durations are written as integer milliseconds
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
