//! Pacing between downloads
//!
//! Bulk retrieval spaces its transfers with randomized delays so the session
//! never shows a fixed cadence. The rule is selected from the 1-based position
//! of the item just completed inside its container (one chat's item list):
//!
//! | position            | rule            | default range   |
//! |---------------------|-----------------|-----------------|
//! | `0` or last item    | none            |                 |
//! | multiple of 20      | `LongBreak`     | 5000-10000 ms   |
//! | multiple of 5       | `MicroPause`    | 1000-3000 ms    |
//! | anything else       | `Base`          | 500-2000 ms     |
//!
//! `BetweenChats` (3000-8000 ms) is applied by the all-chats job after a chat
//! completes while another remains.

use crate::config::{DelayRange, PacingConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use utoipa::ToSchema;

/// Every 20th item takes a long break
pub const LONG_BREAK_EVERY: usize = 20;

/// Every 5th item takes a micro pause
pub const MICRO_PAUSE_EVERY: usize = 5;

/// Which pacing rule selected a delay
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PacingRule {
    /// Between consecutive items
    Base,
    /// After every 5th item
    MicroPause,
    /// After every 20th item
    LongBreak,
    /// Between chats
    BetweenChats,
}

/// Maps item positions to delay ranges
#[derive(Clone, Debug, Default)]
pub struct PacingPolicy {
    config: PacingConfig,
}

impl PacingPolicy {
    /// Create a policy with the given ranges
    pub fn new(config: PacingConfig) -> Self {
        Self { config }
    }

    /// Select the rule after completing item `index` (1-based) of `container_len`.
    ///
    /// Returns `None` before the first item and after the last one; nothing is
    /// spaced there. Long breaks take precedence over micro pauses.
    pub fn rule_for(index: usize, container_len: usize) -> Option<PacingRule> {
        if index == 0 || index >= container_len {
            return None;
        }
        if index % LONG_BREAK_EVERY == 0 {
            Some(PacingRule::LongBreak)
        } else if index % MICRO_PAUSE_EVERY == 0 {
            Some(PacingRule::MicroPause)
        } else {
            Some(PacingRule::Base)
        }
    }

    /// Configured range for a rule
    pub fn range(&self, rule: PacingRule) -> DelayRange {
        match rule {
            PacingRule::Base => self.config.base,
            PacingRule::MicroPause => self.config.micro_pause,
            PacingRule::LongBreak => self.config.long_break,
            PacingRule::BetweenChats => self.config.between_chats,
        }
    }

    /// Rule and range to apply after completing item `index` of `container_len`
    pub fn delay_for(&self, index: usize, container_len: usize) -> Option<(PacingRule, DelayRange)> {
        Self::rule_for(index, container_len).map(|rule| (rule, self.range(rule)))
    }

    /// Draw a delay uniformly from `range`
    pub fn sample(range: DelayRange) -> Duration {
        if range.max_ms <= range.min_ms {
            return Duration::from_millis(range.min_ms);
        }
        let millis = rand::thread_rng().gen_range(range.min_ms..=range.max_ms);
        Duration::from_millis(millis)
    }
}
