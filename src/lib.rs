//! # voicenote-dl
//!
//! Chat session supervisor and paced bulk voice note retrieval.
//!
//! ## Design Philosophy
//!
//! voicenote-dl is designed to be:
//! - **Protocol-agnostic** - The chat protocol client plugs in through the [`ChatSession`] trait
//! - **Self-healing** - Transient disconnects reconnect with capped exponential backoff
//! - **Polite** - Bulk downloads are spaced with randomized delays
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use voicenote_dl::{Config, VoiceRelay};
//! use voicenote_dl::session::ChatSession;
//! use std::sync::Arc;
//!
//! # async fn connect_client() -> Arc<dyn ChatSession> { unimplemented!() }
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = connect_client().await;
//!     let relay = VoiceRelay::new(Config::default(), client)?;
//!
//!     // Subscribe to events
//!     let mut events = relay.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     relay.start().await;
//!     let progress = relay.download_voices("+49 151 12345678", None, None).await?;
//!     println!("Downloading {} voice notes", progress.total);
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API server
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Delay selection between downloads
pub mod pacing;
/// Relay instance and lifecycle
pub mod relay;
/// Bulk voice note retrieval
pub mod retrieval;
/// Reconnect classification and backoff
pub mod retry;
/// Chat session supervision and sending
pub mod session;
/// Media persistence
pub mod sink;
/// Core types
pub mod types;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, PacingConfig, ReconnectConfig, RetrievalConfig, SessionConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use pacing::{PacingPolicy, PacingRule};
pub use relay::VoiceRelay;
pub use retrieval::RetrievalController;
pub use retry::IsRetryable;
pub use session::{ChatSession, CloseReason, OutboundPayload, SessionEvent, SessionManager};
pub use sink::{FileSink, MediaSink};
pub use types::{
    ChatId, ConnectionState, Direction, Event, JobScope, JobStatus, MediaHandle, MessageId,
    MessageKind, Progress, RawMessage, VoiceItem,
};

/// Run the relay until a termination signal arrives, then shut it down.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use voicenote_dl::{Config, VoiceRelay, run_with_shutdown};
/// use voicenote_dl::session::ChatSession;
/// use std::sync::Arc;
///
/// # async fn example(client: Arc<dyn ChatSession>) -> Result<(), Box<dyn std::error::Error>> {
/// let relay = Arc::new(VoiceRelay::new(Config::default(), client)?);
/// relay.start().await;
/// let _api = relay.spawn_api_server();
///
/// run_with_shutdown(&relay).await;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(relay: &VoiceRelay) {
    wait_for_signal().await;
    relay.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
