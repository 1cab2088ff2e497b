//! Startup and shutdown coordination.

use super::VoiceRelay;
use crate::types::Event;

impl VoiceRelay {
    /// Start the session supervisor
    ///
    /// Returns `false` if it is already running or the relay was shut down.
    pub async fn start(&self) -> bool {
        let started = self.session.start().await;
        if started {
            tracing::info!(
                user_server = %self.config.session.user_server,
                "Voice relay started"
            );
        }
        started
    }

    /// Gracefully shut down the relay
    ///
    /// 1. Stops the running download job and waits for its in-flight item
    /// 2. Stops the session supervisor and disconnects
    /// 3. Emits [`Event::Shutdown`]
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.retrieval.shutdown().await;
        tracing::info!("Download job stopped");

        self.session.shutdown().await;

        let _ = self.event_tx.send(Event::Shutdown);
        tracing::info!("Shutdown complete");
    }
}
