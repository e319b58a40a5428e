//! Per-pair session controller
//!
//! `start_session` runs the fixed startup sequence: resolve endpoints,
//! fetch the initial snapshot, and only then hand off to a live channel
//! strategy. A failed initial fetch surfaces the error and starts
//! nothing. The returned [`Session`] owns the channel task and tears it
//! down as a unit.

use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use pricewall_core::{FeedError, FeedResult, FeedTiming, TokenPairConfig};

use crate::fetcher;
use crate::live::{LiveChannel, PollingChannel};
use crate::resolver::EndpointResolver;
use crate::state::{SessionState, SessionView};

/// Handle to one running pair session.
///
/// The channel socket, event subscription, and timers all live inside
/// the spawned task; dropping or stopping the session signals that task
/// to release them on its way out.
pub struct Session {
    state: Arc<SessionState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Session {
    pub fn state(&self) -> Arc<SessionState> {
        Arc::clone(&self.state)
    }

    pub fn view(&self) -> SessionView {
        self.state.view()
    }

    /// Tear the session down. Idempotent: safe on an already-stopped or
    /// partially-initialized session.
    pub async fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        debug!(pair = %self.state.pair_id(), "session stopped");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Last-resort teardown when the host never called stop(); the
        // channel task sees the closed signal and winds itself down.
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Start a session for one pair: snapshot first, then the live channel.
pub async fn start_session(
    resolver: &EndpointResolver,
    pair: TokenPairConfig,
    timing: FeedTiming,
) -> FeedResult<Session> {
    let endpoints = resolver.resolve(pair.family).await?;

    let client = reqwest::Client::builder()
        .timeout(timing.request_timeout())
        .build()
        .map_err(|e| FeedError::Configuration(format!("http client: {e}")))?;

    // A failed initial fetch stops the sequence here: no channel, no
    // timers, nothing to tear down.
    let snapshot = fetcher::fetch_snapshot(&client, &endpoints.http_url, &pair).await?;

    let state = SessionState::new(&pair);
    state.apply_price(snapshot);
    info!(pair = %pair.id, price = snapshot.price, "session started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = match endpoints.ws_url {
        Some(ws_url) => {
            let channel = LiveChannel::new(pair, ws_url, timing, Arc::clone(&state));
            tokio::spawn(channel.run(shutdown_rx))
        }
        None => {
            let channel = PollingChannel::new(
                pair,
                endpoints.http_url,
                client,
                timing,
                Arc::clone(&state),
            );
            tokio::spawn(channel.run(shutdown_rx))
        }
    };

    Ok(Session {
        state,
        shutdown: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewall_core::builtin_pairs;
    use std::time::Duration;

    fn dummy_session() -> Session {
        let state = SessionState::new(&builtin_pairs()[0]);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            // stand-in channel task: wait for the shutdown signal
            let _ = shutdown_rx.await;
            task_state.shut_down();
        });
        Session {
            state,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let mut session = dummy_session();
        session.stop().await;
        session.stop().await;

        assert_eq!(
            session.view().connection,
            pricewall_core::ConnectionState::ShutDown
        );
        assert!(session.shutdown.is_none());
        assert!(session.task.is_none());
    }

    #[tokio::test]
    async fn drop_signals_the_channel_task() {
        let session = dummy_session();
        let state = session.state();
        drop(session);

        // the stand-in task marks shutdown once the signal lands
        let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
        loop {
            if state.connection() == pricewall_core::ConnectionState::ShutDown {
                break;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "task never saw the shutdown signal"
            );
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[tokio::test]
    async fn failed_start_never_reports_connected() {
        // resolver URL that cannot respond: start_session must fail
        // before any channel exists
        let resolver = EndpointResolver::new("http://127.0.0.1:1/api/rpc-url");
        let result = start_session(
            &resolver,
            builtin_pairs()[0].clone(),
            FeedTiming::default(),
        )
        .await;

        assert!(matches!(result, Err(FeedError::Configuration(_))));
    }
}
