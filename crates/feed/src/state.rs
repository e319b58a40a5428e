//! Per-session shared state
//!
//! One `SessionState` per pair session, mutated only by that session's
//! task. Everything upward (the HTTP layer, display components) gets a
//! read-only [`SessionView`] snapshot.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use pricewall_core::{
    ActivityEntry, ActivityLog, ConnectionState, PriceSnapshot, Side, TokenPairConfig,
};

#[derive(Debug)]
pub struct SessionState {
    pair_id: String,
    title: String,
    inner: RwLock<Inner>,
}

#[derive(Debug)]
struct Inner {
    price: Option<PriceSnapshot>,
    connection: ConnectionState,
    error: Option<String>,
    activity: ActivityLog,
    entry_seq: u64,
}

impl SessionState {
    pub fn new(pair: &TokenPairConfig) -> Arc<Self> {
        Arc::new(Self {
            pair_id: pair.id.clone(),
            title: pair.title.clone(),
            inner: RwLock::new(Inner {
                price: None,
                connection: ConnectionState::Disconnected,
                error: None,
                activity: ActivityLog::new(),
                entry_seq: 0,
            }),
        })
    }

    pub fn pair_id(&self) -> &str {
        &self.pair_id
    }

    /// Apply a fresh price snapshot. Events arrive in order, so the
    /// latest application always wins.
    pub fn apply_price(&self, snapshot: PriceSnapshot) {
        self.inner.write().price = Some(snapshot);
    }

    /// Record a classified trade, evicting the oldest entry past the cap.
    pub fn record_trade(&self, side: Side, base_amount: f64, quote_amount: f64) {
        let mut inner = self.inner.write();
        inner.entry_seq += 1;
        let occurred_at = Utc::now();
        let entry = ActivityEntry {
            id: format!("{}-{}", occurred_at.timestamp_millis(), inner.entry_seq),
            side,
            base_amount,
            quote_amount,
            occurred_at,
        };
        inner.activity.push(entry);
    }

    pub fn set_connection(&self, connection: ConnectionState) {
        self.inner.write().connection = connection;
    }

    pub fn connection(&self) -> ConnectionState {
        self.inner.read().connection
    }

    /// Record an error without touching the last-known price: once a
    /// price has been shown, failures degrade the display, they never
    /// blank it.
    pub fn set_error(&self, message: impl Into<String>) {
        self.inner.write().error = Some(message.into());
    }

    pub fn clear_error(&self) {
        self.inner.write().error = None;
    }

    /// Terminal teardown: clears the activity log and marks the session
    /// shut down. No further transitions happen after this.
    pub fn shut_down(&self) {
        let mut inner = self.inner.write();
        inner.connection = ConnectionState::ShutDown;
        inner.activity.clear();
    }

    pub fn view(&self) -> SessionView {
        let inner = self.inner.read();
        SessionView {
            pair: self.pair_id.clone(),
            title: self.title.clone(),
            price: inner.price.map(|s| s.price),
            last_update: inner.price.map(|s| s.observed_at),
            is_connected: inner.connection.is_connected(),
            connection: inner.connection,
            error: inner.error.clone(),
            transactions: inner.activity.to_vec(),
        }
    }
}

/// Read-only snapshot of one session, shaped for the display layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub pair: String,
    pub title: String,
    /// `None` until the first price has been derived; the UI shows a
    /// loading indicator in that case.
    pub price: Option<f64>,
    pub last_update: Option<DateTime<Utc>>,
    pub is_connected: bool,
    pub connection: ConnectionState,
    pub error: Option<String>,
    pub transactions: Vec<ActivityEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewall_core::builtin_pairs;

    fn state() -> Arc<SessionState> {
        SessionState::new(&builtin_pairs()[0])
    }

    #[test]
    fn trade_log_respects_cap() {
        let state = state();
        for n in 0..25 {
            state.record_trade(Side::Buy, n as f64, 1.0);
        }
        let view = state.view();
        assert_eq!(view.transactions.len(), ActivityLog::MAX_ENTRIES);
        // newest first
        assert!((view.transactions[0].base_amount - 24.0).abs() < 1e-9);
    }

    #[test]
    fn entry_ids_are_unique() {
        let state = state();
        for _ in 0..10 {
            state.record_trade(Side::Sell, 1.0, 1.0);
        }
        let view = state.view();
        let mut ids: Vec<_> = view.transactions.iter().map(|t| t.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 10);
    }

    #[test]
    fn errors_degrade_without_blanking_the_price() {
        let state = state();
        state.apply_price(PriceSnapshot::now(1234.5));
        state.set_connection(ConnectionState::Connected);

        state.set_error("connection lost");
        state.set_connection(ConnectionState::Error);

        let view = state.view();
        assert_eq!(view.price, Some(1234.5));
        assert_eq!(view.error.as_deref(), Some("connection lost"));
        assert!(!view.is_connected);
    }

    #[test]
    fn shutdown_clears_activity() {
        let state = state();
        state.record_trade(Side::Buy, 1.0, 2.0);
        state.shut_down();

        let view = state.view();
        assert!(view.transactions.is_empty());
        assert_eq!(view.connection, ConnectionState::ShutDown);
    }
}
