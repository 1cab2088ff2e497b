//! Reconnect backoff
//!
//! Unexpected session closes are classified as terminal or transient through
//! [`IsRetryable`]. Transient closes are retried forever with a capped
//! exponential delay:
//!
//! ```text
//! delay(n) = min(base * 2^(n-1), cap)      n = 1, 2, 3, ...
//! ```
//!
//! With the defaults (base 5 s, cap 60 s) the sequence is
//! 5 s, 10 s, 20 s, 40 s, 60 s, 60 s, ...
//!
//! # Example
//!
//! ```
//! use voicenote_dl::config::ReconnectConfig;
//! use voicenote_dl::retry::reconnect_delay;
//! use std::time::Duration;
//!
//! let config = ReconnectConfig::default();
//! assert_eq!(reconnect_delay(&config, 3), Duration::from_secs(20));
//! ```

use crate::config::ReconnectConfig;
use crate::session::CloseReason;
use rand::Rng;
use std::time::Duration;

/// Trait for failures that can be classified as retryable or not
///
/// Transient failures (connection lost, timed out, server restart) return `true`.
/// Terminal failures (logged out, credentials revoked) return `false`.
pub trait IsRetryable {
    /// Returns true if the failure is transient and a reconnect should follow
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for CloseReason {
    fn is_retryable(&self) -> bool {
        match self {
            // The account was unlinked; only a fresh pairing helps
            CloseReason::LoggedOut => false,
            CloseReason::CredentialsRevoked => false,
            CloseReason::ConnectionLost
            | CloseReason::ConnectionClosed
            | CloseReason::TimedOut
            | CloseReason::RestartRequired
            | CloseReason::ConnectFailed(_)
            | CloseReason::Other(_) => true,
        }
    }
}

/// Delay before reconnect attempt `attempt` (1-based)
///
/// Attempt 0 is treated like attempt 1. Exponent growth saturates so very
/// large attempt counts stay at the cap.
pub fn reconnect_delay(config: &ReconnectConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(31);
    let base_ms = config.base_delay.as_millis() as u64;
    let delay_ms = base_ms.saturating_mul(1u64 << exponent);
    let capped = Duration::from_millis(delay_ms).min(config.max_delay);

    if config.jitter {
        add_jitter(capped).min(config.max_delay)
    } else {
        capped
    }
}

/// Add up to 20% random jitter to a delay
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=0.2);
    Duration::from_secs_f64(delay.as_secs_f64() * (1.0 + jitter_factor))
}
