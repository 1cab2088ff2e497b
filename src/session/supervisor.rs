//! Connect loop, close classification and reconnect backoff.

use super::SessionManager;
use super::traits::{CloseReason, SessionEvent};
use crate::retry::{IsRetryable, reconnect_delay};
use crate::types::{ConnectionState, Event};
use std::sync::atomic::Ordering;

impl SessionManager {
    /// Start the connection supervisor
    ///
    /// Spawns one background task that connects, tracks lifecycle events, and
    /// reconnects after transient closes. Only one supervisor exists at a time,
    /// so connection attempts never overlap. Returns `false` if a supervisor is
    /// already running or the manager was shut down.
    ///
    /// After a terminal close (logout) the supervisor exits; calling `start()`
    /// again begins a fresh pairing.
    pub async fn start(&self) -> bool {
        // Held until the handle is stored so shutdown() always finds it
        let mut supervisor = self.supervisor.lock().await;

        if self.shutdown.is_cancelled() {
            tracing::warn!("Session manager was shut down, not starting");
            return false;
        }
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::debug!("Session supervisor already running");
            return false;
        }

        tracing::info!(session = self.session.name(), "Starting chat session supervisor");

        let manager = self.clone();
        *supervisor = Some(tokio::spawn(async move {
            manager.run_supervisor().await;
            manager.running.store(false, Ordering::SeqCst);
        }));
        true
    }

    async fn run_supervisor(&self) {
        loop {
            let reason = self.connect_once().await;

            if self.shutdown.is_cancelled() {
                break;
            }

            if !reason.is_retryable() {
                self.transition(ConnectionState::Disconnected, None);
                tracing::warn!(reason = %reason, "Session closed permanently, re-pairing required");
                let _ = self.event_tx.send(Event::AuthTerminated {
                    reason: reason.to_string(),
                });
                return;
            }

            let attempt = self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let delay = reconnect_delay(&self.config.reconnect, attempt);
            self.transition(ConnectionState::Disconnected, None);

            tracing::warn!(
                reason = %reason,
                attempt,
                delay_ms = delay.as_millis() as u64,
                "Session closed, reconnecting"
            );
            let _ = self.event_tx.send(Event::Reconnecting {
                attempt,
                delay_ms: delay.as_millis() as u64,
                reason: reason.to_string(),
            });

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = self.shutdown.cancelled() => break,
            }
        }

        self.transition(ConnectionState::Disconnected, None);
        tracing::info!("Session supervisor stopped");
    }

    /// Run one connection until it closes and report why
    async fn connect_once(&self) -> CloseReason {
        self.transition(ConnectionState::Connecting, None);

        let connect = tokio::select! {
            result = self.session.connect() => result,
            _ = self.shutdown.cancelled() => return CloseReason::ConnectionClosed,
        };
        let mut events = match connect {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "Chat session connect failed");
                return CloseReason::ConnectFailed(e.to_string());
            }
        };

        loop {
            let event = tokio::select! {
                event = events.recv() => event,
                _ = self.shutdown.cancelled() => return CloseReason::ConnectionClosed,
            };

            match event {
                Some(SessionEvent::PairingCode(code)) => {
                    tracing::info!("Pairing code issued, waiting for scan");
                    self.transition(ConnectionState::QrPending, Some(code));
                }
                Some(SessionEvent::Open) => {
                    let previous_attempts = self.reconnect_attempts.swap(0, Ordering::SeqCst);
                    tracing::info!(previous_attempts, "Chat session connected");
                    self.transition(ConnectionState::Connected, None);
                }
                Some(SessionEvent::Message(message)) => {
                    tracing::trace!(
                        chat_id = %message.chat_id,
                        message_id = %message.id,
                        "Inbound message"
                    );
                    let _ = self.event_tx.send(Event::MessageReceived {
                        chat_id: message.chat_id.clone(),
                        message_id: message.id.clone(),
                        kind: message.kind,
                    });
                    // No subscribers is fine
                    let _ = self.inbound_tx.send(message);
                }
                Some(SessionEvent::Closed(reason)) => return reason,
                None => return CloseReason::ConnectionLost,
            }
        }
    }
}
