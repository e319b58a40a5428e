//! Live update channel
//!
//! Keeps a session's price fresh over a standing WebSocket subscription
//! to the pool's event logs. Push-channel failures are frequently silent
//! (no error frame ever arrives), so a periodic liveness probe is the
//! death detector: an `eth_chainId` round-trip that must be answered
//! before the next probe tick.
//!
//! Reconnection is a fixed delay, retried forever. The shutdown signal
//! is honored at every await point, including mid-reconnect-sleep, so a
//! torn-down session can never resurrect its channel.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, trace, warn};

use pricewall_core::{
    derive_price, ConnectionState, FeedError, FeedResult, FeedTiming, PoolModel, PriceSnapshot,
    TokenPairConfig,
};

use crate::events;
use crate::fetcher;
use crate::rpc::{self, LogEntry, RpcFrame};
use crate::state::SessionState;

/// Request id of the one subscription call per connection.
const SUBSCRIBE_ID: u64 = 1;

/// WebSocket strategy: subscribe to the pool's logs and re-derive the
/// price per event.
pub struct LiveChannel {
    pair: TokenPairConfig,
    ws_url: String,
    timing: FeedTiming,
    state: Arc<SessionState>,
}

impl LiveChannel {
    pub fn new(
        pair: TokenPairConfig,
        ws_url: String,
        timing: FeedTiming,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            pair,
            ws_url,
            timing,
            state,
        }
    }

    /// Drive the channel until shutdown. Every channel failure schedules
    /// exactly one reconnect after the fixed delay.
    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            self.state.set_connection(ConnectionState::Connecting);

            match self.connect_and_stream(&mut shutdown).await {
                Ok(()) => {
                    self.state.shut_down();
                    debug!(pair = %self.pair.id, "live channel shut down");
                    return;
                }
                Err(e) => {
                    warn!(
                        pair = %self.pair.id,
                        error = %e,
                        delay_ms = self.timing.reconnect_delay_ms,
                        "channel failed, scheduling reconnect"
                    );
                    self.state.set_error(e.to_string());
                    self.state.set_connection(ConnectionState::Error);

                    tokio::select! {
                        _ = &mut shutdown => {
                            self.state.shut_down();
                            debug!(pair = %self.pair.id, "shutdown cancelled pending reconnect");
                            return;
                        }
                        _ = sleep(self.timing.reconnect_delay()) => {}
                    }
                }
            }
        }
    }

    /// One connection lifetime. `Ok(())` means shutdown was requested;
    /// any `Err` is a channel failure the caller retries.
    async fn connect_and_stream(
        &self,
        shutdown: &mut oneshot::Receiver<()>,
    ) -> FeedResult<()> {
        info!(pair = %self.pair.id, url = %self.ws_url, "connecting");

        let ws = tokio::select! {
            _ = &mut *shutdown => return Ok(()),
            connected = connect_async(&self.ws_url) => {
                connected
                    .map_err(|e| FeedError::Channel(format!("connect failed: {e}")))?
                    .0
            }
        };
        let (mut write, mut read) = ws.split();

        let subscribe = rpc::request(
            SUBSCRIBE_ID,
            "eth_subscribe",
            json!([
                "logs",
                {
                    "address": self.pair.pool.to_string(),
                    "topics": [topic_filter(&self.pair)],
                }
            ]),
        );
        write
            .send(Message::Text(subscribe.to_string()))
            .await
            .map_err(|e| FeedError::Channel(format!("subscribe send failed: {e}")))?;

        let mut subscription_id: Option<String> = None;
        let mut probe_pending: Option<u64> = None;
        let mut next_request_id = SUBSCRIBE_ID;

        let mut probe = interval_at(
            Instant::now() + self.timing.probe_interval(),
            self.timing.probe_interval(),
        );
        probe.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut *shutdown => {
                    // Teardown order: the probe interval dies with this
                    // scope, no reconnect is pending inside a healthy
                    // connection, then unsubscribe, then close.
                    if let Some(id) = subscription_id {
                        next_request_id += 1;
                        let unsubscribe =
                            rpc::request(next_request_id, "eth_unsubscribe", json!([id]));
                        let _ = write.send(Message::Text(unsubscribe.to_string())).await;
                    }
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }

                _ = probe.tick() => {
                    if probe_pending.is_some() {
                        return Err(FeedError::Channel(
                            "liveness probe went unanswered".to_string(),
                        ));
                    }
                    next_request_id += 1;
                    let ping = rpc::request(next_request_id, "eth_chainId", json!([]));
                    write
                        .send(Message::Text(ping.to_string()))
                        .await
                        .map_err(|e| FeedError::Channel(format!("probe send failed: {e}")))?;
                    probe_pending = Some(next_request_id);
                    trace!(pair = %self.pair.id, id = next_request_id, "probe sent");
                }

                message = read.next() => {
                    let message = message
                        .ok_or_else(|| FeedError::Channel("stream ended".to_string()))?
                        .map_err(|e| FeedError::Channel(format!("stream error: {e}")))?;

                    match message {
                        Message::Text(text) => {
                            self.handle_frame(&text, &mut subscription_id, &mut probe_pending)?;
                        }
                        Message::Ping(payload) => {
                            write
                                .send(Message::Pong(payload))
                                .await
                                .map_err(|e| FeedError::Channel(format!("pong failed: {e}")))?;
                        }
                        Message::Close(_) => {
                            return Err(FeedError::Channel("closed by server".to_string()));
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    fn handle_frame(
        &self,
        text: &str,
        subscription_id: &mut Option<String>,
        probe_pending: &mut Option<u64>,
    ) -> FeedResult<()> {
        let frame: RpcFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                debug!(pair = %self.pair.id, error = %e, "unparseable frame");
                return Ok(());
            }
        };

        if let Some(id) = frame.id {
            if Some(id) == *probe_pending {
                // Any response to the probe id proves the channel alive
                *probe_pending = None;
                trace!(pair = %self.pair.id, id, "probe answered");
                return Ok(());
            }

            if id == SUBSCRIBE_ID {
                return match (frame.result, frame.error) {
                    (Some(Value::String(sub)), _) => {
                        info!(pair = %self.pair.id, subscription = %sub, "subscribed");
                        *subscription_id = Some(sub);
                        self.state.clear_error();
                        self.state.set_connection(ConnectionState::Connected);
                        Ok(())
                    }
                    (_, Some(err)) => Err(FeedError::Channel(format!(
                        "subscribe failed: {} ({})",
                        err.message, err.code
                    ))),
                    _ => Err(FeedError::Channel(
                        "subscribe response missing result".to_string(),
                    )),
                };
            }

            if let Some(err) = frame.error {
                // Channel-level error: mark unhealthy but keep streaming.
                // The next failed probe completes the teardown.
                warn!(pair = %self.pair.id, code = err.code, message = %err.message, "rpc error frame");
                self.state.set_error(format!("rpc error: {}", err.message));
                self.state.set_connection(ConnectionState::Error);
            }
            return Ok(());
        }

        if frame.method.as_deref() == Some("eth_subscription") {
            if let Some(params) = frame.params {
                match serde_json::from_value::<LogEntry>(params.result) {
                    Ok(log) => self.handle_log(&log),
                    Err(e) => debug!(pair = %self.pair.id, error = %e, "undecodable log"),
                }
            }
        }

        Ok(())
    }

    fn handle_log(&self, log: &LogEntry) {
        if log.removed {
            // reorged-out log; its state is no longer current
            return;
        }

        let Some(event) = events::decode_log(log) else {
            return;
        };

        if let Some(pool_state) = events::price_state(&event) {
            match derive_price(&pool_state, &self.pair) {
                Ok(price) => {
                    self.state.apply_price(PriceSnapshot::now(price));
                    trace!(pair = %self.pair.id, price, "price updated");
                }
                Err(e) => {
                    warn!(pair = %self.pair.id, error = %e, "skipping degenerate update");
                }
            }
        }

        if let Some((side, base_amount, quote_amount)) = events::classify_trade(&event, &self.pair)
        {
            debug!(
                pair = %self.pair.id,
                %side,
                base_amount,
                quote_amount,
                "trade recorded"
            );
            self.state.record_trade(side, base_amount, quote_amount);
        }
    }
}

fn topic_filter(pair: &TokenPairConfig) -> Vec<&'static str> {
    match pair.model {
        PoolModel::SqrtPriceX96 => vec![events::V3_SWAP_TOPIC],
        PoolModel::ReservePair => vec![events::V2_SWAP_TOPIC, events::V2_SYNC_TOPIC],
    }
}

/// Polling strategy: the degraded-mode implementation of the same
/// contract for families without a push endpoint. Same teardown rules,
/// same retry-forever semantics.
pub struct PollingChannel {
    pair: TokenPairConfig,
    http_url: String,
    client: reqwest::Client,
    timing: FeedTiming,
    state: Arc<SessionState>,
}

impl PollingChannel {
    pub fn new(
        pair: TokenPairConfig,
        http_url: String,
        client: reqwest::Client,
        timing: FeedTiming,
        state: Arc<SessionState>,
    ) -> Self {
        Self {
            pair,
            http_url,
            client,
            timing,
            state,
        }
    }

    pub async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        info!(
            pair = %self.pair.id,
            every_ms = self.timing.poll_interval_ms,
            "no push endpoint, polling"
        );
        self.state.set_connection(ConnectionState::Connected);

        let mut ticker = interval_at(
            Instant::now() + self.timing.poll_interval(),
            self.timing.poll_interval(),
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    self.state.shut_down();
                    debug!(pair = %self.pair.id, "polling channel shut down");
                    return;
                }
                _ = ticker.tick() => {
                    match fetcher::fetch_snapshot(&self.client, &self.http_url, &self.pair).await {
                        Ok(snapshot) => {
                            self.state.apply_price(snapshot);
                            self.state.clear_error();
                            self.state.set_connection(ConnectionState::Connected);
                        }
                        Err(e) => {
                            warn!(pair = %self.pair.id, error = %e, "poll failed");
                            self.state.set_error(e.to_string());
                            self.state.set_connection(ConnectionState::Error);
                        }
                    }
                }
            }
        }
    }
}
