//! Application state for the API server

use crate::VoiceRelay;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The relay instance
    pub relay: Arc<VoiceRelay>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(relay: Arc<VoiceRelay>) -> Self {
        Self { relay }
    }
}
