//! Session supervision
//!
//! One background task per configured pair: keep invoking the session
//! controller until a session sticks, then hold it until shutdown.
//! Configuration and fetch failures are surfaced in the pair's view and
//! retried host-side after the fixed delay (the core itself never
//! retries those).

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{info, warn};

use pricewall_core::{ConnectionState, FeedTiming, TokenPairConfig};
use pricewall_feed::{start_session, EndpointResolver, SessionState, SessionView};

enum PairEntry {
    /// Not started yet, or start failed; holds the last error if any.
    Pending { title: String, error: Option<String> },
    Active(Arc<SessionState>),
}

pub struct SessionSupervisor {
    resolver: EndpointResolver,
    timing: FeedTiming,
    pairs: Vec<TokenPairConfig>,
    entries: DashMap<String, PairEntry>,
    shutdown_tx: watch::Sender<bool>,
    tasks: parking_lot::Mutex<Vec<JoinHandle<()>>>,
}

impl SessionSupervisor {
    pub fn new(
        resolver: EndpointResolver,
        pairs: Vec<TokenPairConfig>,
        timing: FeedTiming,
    ) -> Arc<Self> {
        let (shutdown_tx, _) = watch::channel(false);
        let entries = DashMap::new();
        for pair in &pairs {
            entries.insert(
                pair.id.clone(),
                PairEntry::Pending {
                    title: pair.title.clone(),
                    error: None,
                },
            );
        }

        Arc::new(Self {
            resolver,
            timing,
            pairs,
            entries,
            shutdown_tx,
            tasks: parking_lot::Mutex::new(Vec::new()),
        })
    }

    /// Spawn one supervision task per pair.
    pub fn spawn_all(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock();
        for pair in self.pairs.clone() {
            let supervisor = Arc::clone(self);
            let shutdown_rx = self.shutdown_tx.subscribe();
            tasks.push(tokio::spawn(async move {
                supervisor.supervise(pair, shutdown_rx).await;
            }));
        }
    }

    async fn supervise(&self, pair: TokenPairConfig, mut shutdown_rx: watch::Receiver<bool>) {
        let pair_id = pair.id.clone();

        let mut session = loop {
            if *shutdown_rx.borrow() {
                return;
            }

            match start_session(&self.resolver, pair.clone(), self.timing.clone()).await {
                Ok(session) => {
                    self.entries
                        .insert(pair_id.clone(), PairEntry::Active(session.state()));
                    break session;
                }
                Err(e) => {
                    warn!(pair = %pair_id, error = %e, "session start failed");
                    self.entries.insert(
                        pair_id.clone(),
                        PairEntry::Pending {
                            title: pair.title.clone(),
                            error: Some(e.to_string()),
                        },
                    );

                    tokio::select! {
                        _ = shutdown_rx.changed() => return,
                        _ = sleep(self.timing.reconnect_delay()) => {}
                    }
                }
            }
        };

        // Session is live and self-healing; hold it until shutdown.
        while !*shutdown_rx.borrow() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
        session.stop().await;
        info!(pair = %pair_id, "session supervisor exited");
    }

    /// Signal shutdown and wait for every supervised session to stop.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        let tasks: Vec<_> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            let _ = task.await;
        }
    }

    pub fn pair_ids(&self) -> Vec<(String, String)> {
        self.pairs
            .iter()
            .map(|p| (p.id.clone(), p.title.clone()))
            .collect()
    }

    pub fn view(&self, pair_id: &str) -> Option<SessionView> {
        let entry = self.entries.get(pair_id)?;
        Some(match entry.value() {
            PairEntry::Active(state) => state.view(),
            PairEntry::Pending { title, error } => SessionView {
                pair: pair_id.to_string(),
                title: title.clone(),
                price: None,
                last_update: None,
                is_connected: false,
                connection: ConnectionState::Disconnected,
                error: error.clone(),
                transactions: Vec::new(),
            },
        })
    }

    pub fn views(&self) -> Vec<SessionView> {
        self.pairs
            .iter()
            .filter_map(|p| self.view(&p.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewall_core::builtin_pairs;

    #[tokio::test]
    async fn pending_pairs_expose_placeholder_views() {
        let supervisor = SessionSupervisor::new(
            EndpointResolver::new("http://127.0.0.1:1/api/rpc-url"),
            builtin_pairs(),
            FeedTiming::default(),
        );

        let views = supervisor.views();
        assert_eq!(views.len(), 4);
        for view in &views {
            assert!(view.price.is_none());
            assert!(!view.is_connected);
        }
        assert!(supervisor.view("nope").is_none());
    }

    #[tokio::test]
    async fn shutdown_with_no_tasks_is_a_noop() {
        let supervisor = SessionSupervisor::new(
            EndpointResolver::new("http://127.0.0.1:1/api/rpc-url"),
            vec![],
            FeedTiming::default(),
        );
        supervisor.shutdown().await;
        supervisor.shutdown().await;
    }
}
