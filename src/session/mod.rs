//! Session manager: owns the single chat-protocol connection.
//!
//! The manager is organized by concern:
//! - [`traits`] - The [`ChatSession`] seam and its event/close types
//! - [`supervisor`] - Connect loop, close classification and backoff
//! - [`send`] - Target normalization and outbound/history operations
//!
//! State lives in a `watch` channel so reads are side-effect free and callers
//! can await transitions. Only the supervisor task writes it.

mod send;
mod supervisor;
mod traits;


pub use send::normalize_target;
pub use traits::{ChatSession, CloseReason, OutboundPayload, SessionEvent};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::types::{ConnectionState, Event, RawMessage};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Connection state together with the pairing code that belongs to it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SessionSnapshot {
    pub(crate) state: ConnectionState,
    pub(crate) pairing_code: Option<String>,
}

/// Owner of the chat connection (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct SessionManager {
    /// Protocol client
    pub(crate) session: Arc<dyn ChatSession>,
    /// Backoff and normalization settings
    pub(crate) config: Arc<SessionConfig>,
    /// Current state; written by the supervisor only
    pub(crate) state_tx: Arc<watch::Sender<SessionSnapshot>>,
    /// Reconnect attempts since the last successful connect
    pub(crate) reconnect_attempts: Arc<AtomicU32>,
    /// Relay-wide event channel
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Live inbound messages
    pub(crate) inbound_tx: broadcast::Sender<RawMessage>,
    /// Set while a supervisor task exists
    pub(crate) running: Arc<AtomicBool>,
    /// Cancelled by `shutdown()`
    pub(crate) shutdown: CancellationToken,
    /// Supervisor task handle, awaited on shutdown
    pub(crate) supervisor: Arc<tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>>,
}

impl SessionManager {
    /// Create a manager around a protocol client. Nothing connects until [`start`](Self::start).
    pub fn new(
        session: Arc<dyn ChatSession>,
        config: SessionConfig,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        let (state_tx, _rx) = watch::channel(SessionSnapshot::default());
        let (inbound_tx, _rx) = broadcast::channel(config.inbound_buffer.max(1));

        Self {
            session,
            config: Arc::new(config),
            state_tx: Arc::new(state_tx),
            reconnect_attempts: Arc::new(AtomicU32::new(0)),
            event_tx,
            inbound_tx,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: CancellationToken::new(),
            supervisor: Arc::new(tokio::sync::Mutex::new(None)),
        }
    }

    /// Current connection state
    pub fn status(&self) -> ConnectionState {
        self.state_tx.borrow().state
    }

    /// Pairing code to scan, present only while the state is `qr_pending`
    pub fn pairing_code(&self) -> Option<String> {
        self.state_tx.borrow().pairing_code.clone()
    }

    /// Reconnect attempts since the last successful connect
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Whether the supervisor task is alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Subscribe to live inbound messages
    pub fn subscribe_inbound(&self) -> broadcast::Receiver<RawMessage> {
        self.inbound_tx.subscribe()
    }

    /// Wait until the session reaches `target`, or fail after `timeout`
    pub async fn wait_for_state(&self, target: ConnectionState, timeout: Duration) -> Result<()> {
        let mut rx = self.state_tx.subscribe();
        let wait = async {
            rx.wait_for(|snapshot| snapshot.state == target)
                .await
                .map(|_| ())
                .map_err(|_| Error::Session("session state channel closed".to_string()))
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                target: target.to_string(),
                elapsed_ms: timeout.as_millis() as u64,
            }),
        }
    }

    pub(crate) fn require_connected(&self) -> Result<()> {
        if self.status() == ConnectionState::Connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Replace state and pairing code, emitting events for what changed
    pub(crate) fn transition(&self, state: ConnectionState, pairing_code: Option<String>) {
        let previous = self.state_tx.send_replace(SessionSnapshot {
            state,
            pairing_code: pairing_code.clone(),
        });

        if previous.state != state {
            tracing::debug!(from = %previous.state, to = %state, "Session state changed");
            let _ = self.event_tx.send(Event::ConnectionChanged { state });
        }

        if let Some(code) = pairing_code
            && previous.pairing_code.as_deref() != Some(code.as_str())
        {
            let _ = self.event_tx.send(Event::PairingCode { code });
        }
    }

    /// Stop the supervisor and close the connection
    ///
    /// After shutdown the manager stays `disconnected` and cannot be started again.
    pub async fn shutdown(&self) {
        tracing::info!(session = self.session.name(), "Shutting down chat session");
        self.shutdown.cancel();

        if let Err(e) = self.session.disconnect().await {
            tracing::warn!(error = %e, "Chat session disconnect failed");
        }

        let handle = self.supervisor.lock().await.take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, "Session supervisor task ended abnormally");
        }

        self.transition(ConnectionState::Disconnected, None);
    }
}
