//! Timing configuration shared by every interaction

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// All bounded waits and fixed pauses of the interaction layer.
///
/// Every wait in the engine and the playback protocol reads one of these
/// fields; nothing sleeps on a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionTimings {
    /// Page load deadline for navigations
    pub navigation_timeout_ms: u64,

    /// How long to look for the consent dialog after a navigation
    pub consent_timeout_ms: u64,

    /// Pause after accepting the consent dialog
    pub consent_settle_ms: u64,

    /// Polling period of `wait_for_any_of`
    pub poll_interval_ms: u64,

    /// Pause after opening a content item
    pub click_settle_ms: u64,

    /// Wait for the player to show up on a watch page
    pub player_ready_timeout_ms: u64,

    /// Grace period before the first ad probe
    pub ad_grace_ms: u64,

    /// Pause between ad probes
    pub ad_poll_interval_ms: u64,

    /// Ad probes before giving up on skipping
    pub ad_max_attempts: u32,

    /// Hard ceiling on ad probes, whatever `ad_max_attempts` says
    pub ad_attempt_ceiling: u32,

    /// Pause after dismissing a prompt
    pub prompt_settle_ms: u64,

    /// Wait for the up-next list on a watch page
    pub up_next_timeout_ms: u64,

    /// Wait for a channel listing after switching its filter
    pub listing_timeout_ms: u64,

    /// Pause after a search results page loads
    pub search_settle_ms: u64,

    /// Pause after each scroll step
    pub scroll_settle_ms: u64,
}

impl Default for InteractionTimings {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: 30_000,
            consent_timeout_ms: 2_000,
            consent_settle_ms: 2_000,
            poll_interval_ms: 250,
            click_settle_ms: 2_000,
            player_ready_timeout_ms: 10_000,
            ad_grace_ms: 1_000,
            ad_poll_interval_ms: 2_000,
            ad_max_attempts: 10,
            ad_attempt_ceiling: 30,
            prompt_settle_ms: 1_000,
            up_next_timeout_ms: 15_000,
            listing_timeout_ms: 10_000,
            search_settle_ms: 3_000,
            scroll_settle_ms: 1_000,
        }
    }
}

impl InteractionTimings {
    /// No pauses, short deadlines. For tests and dry runs.
    pub fn immediate() -> Self {
        Self {
            navigation_timeout_ms: 1_000,
            consent_timeout_ms: 0,
            consent_settle_ms: 0,
            poll_interval_ms: 10,
            click_settle_ms: 0,
            player_ready_timeout_ms: 0,
            ad_grace_ms: 0,
            ad_poll_interval_ms: 0,
            prompt_settle_ms: 0,
            up_next_timeout_ms: 0,
            listing_timeout_ms: 0,
            search_settle_ms: 0,
            scroll_settle_ms: 0,
            ..Self::default()
        }
    }

    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Ad probes actually allowed.
    pub fn ad_attempts(&self) -> u32 {
        self.ad_max_attempts.min(self.ad_attempt_ceiling).max(1)
    }
}
