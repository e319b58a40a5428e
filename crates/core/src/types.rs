//! Session state primitives
//!
//! CRITICAL: Always use correct decimals!
//! - USDC/USDT: 6 decimals (NOT 18!)
//! - WBTC: 8 decimals
//! - Most others: 18 decimals

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Trade direction, as seen from the pair's base token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Connection health of a session's live channel.
///
/// Owned exclusively by the channel task; read-only everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Retriable failure; a reconnect is already scheduled.
    Error,
    /// Terminal, entered only via explicit teardown.
    ShutDown,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// A derived price with its observation time.
///
/// The session's current price is always the most recent snapshot by
/// observation time; events are applied in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub price: f64,
    pub observed_at: DateTime<Utc>,
}

impl PriceSnapshot {
    pub fn now(price: f64) -> Self {
        Self {
            price,
            observed_at: Utc::now(),
        }
    }
}

/// One classified trade from the live channel.
///
/// Amounts are non-negative magnitudes; the sign of the raw event is
/// consumed only to pick the side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub side: Side,
    pub base_amount: f64,
    pub quote_amount: f64,
    pub occurred_at: DateTime<Utc>,
}

/// Newest-first ring of recent trades, capped at [`ActivityLog::MAX_ENTRIES`].
#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityEntry>,
}

impl ActivityLog {
    pub const MAX_ENTRIES: usize = 10;

    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, evicting the oldest once full.
    pub fn push(&mut self, entry: ActivityEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(Self::MAX_ENTRIES);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ActivityEntry> {
        self.entries.iter().cloned().collect()
    }
}

/// Convert a raw integer amount to a human amount given its decimals.
pub fn format_units(amount: U256, decimals: u8) -> f64 {
    u256_to_f64(amount) / 10f64.powi(decimals as i32)
}

/// Lossy (best-effort double precision) conversion via decimal string.
pub fn u256_to_f64(value: U256) -> f64 {
    value.to_string().parse().unwrap_or(0.0)
}
