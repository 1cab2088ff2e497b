//! The relay instance tying the session, retrieval controller and event
//! channel together.
//!
//! - [`lifecycle`] - Startup and shutdown coordination
//! - [`downloads`] - Download entry points with request defaults applied

mod downloads;
mod lifecycle;


use crate::config::Config;
use crate::error::Result;
use crate::retrieval::RetrievalController;
use crate::session::{ChatSession, SessionManager};
use crate::types::Event;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event broadcast channel; slow subscribers lag beyond it
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Main relay instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct VoiceRelay {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Chat session supervisor
    pub(crate) session: SessionManager,
    /// Bulk voice note retrieval
    pub(crate) retrieval: RetrievalController,
}

impl VoiceRelay {
    /// Create a relay around a chat protocol client
    ///
    /// The configuration is validated first. Nothing connects until
    /// [`start`](Self::start) is called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration is invalid.
    pub fn new(config: Config, session: Arc<dyn ChatSession>) -> Result<Self> {
        config.validate()?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let manager = SessionManager::new(session, config.session.clone(), event_tx.clone());
        let retrieval =
            RetrievalController::new(manager.clone(), config.retrieval.clone(), event_tx.clone());

        Ok(Self {
            config: Arc::new(config),
            event_tx,
            session: manager,
            retrieval,
        })
    }

    /// Subscribe to relay events
    ///
    /// Each subscriber gets its own receiver. A subscriber that falls more
    /// than the channel capacity behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Session manager (state, pairing code, sending)
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Bulk retrieval controller (progress, stop)
    pub fn retrieval(&self) -> &RetrievalController {
        &self.retrieval
    }

    /// Spawn the REST API server in a background task
    ///
    /// The server listens on `server.api.bind_address` (default 127.0.0.1:3001).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let relay = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(relay, config).await })
    }
}
