//! Feed timing configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing knobs for a pair session's live channel.
///
/// Reconnection uses a fixed delay rather than exponential backoff: the
/// dashboard is low-volume and must simply keep retrying forever.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedTiming {
    pub reconnect_delay_ms: u64,
    pub probe_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for FeedTiming {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
            probe_interval_ms: 30_000,
            poll_interval_ms: 60_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl FeedTiming {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
