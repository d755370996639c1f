//! Poll loop driving aggregation and publication.
//!
//! # Responsibilities
//! - Aggregate once at startup, then on every interval tick
//! - Publish each snapshot to the query cache and the file slot
//! - Stop after the in-flight cycle when shutdown is signalled

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{broadcast, watch};
use tokio::time::{self, MissedTickBehavior};

use crate::aggregator::Aggregator;
use crate::dynamic::UnifiedConfiguration;
use crate::http::SnapshotCache;
use crate::observability::metrics;
use crate::sink::SnapshotSender;

/// Where the poller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Aggregating,
    Publishing,
    Terminated,
}

/// Destinations of every completed snapshot.
#[derive(Default)]
pub struct Sinks {
    pub query: Option<SnapshotCache>,
    pub file: Option<SnapshotSender>,
}

impl Sinks {
    /// Hand `snapshot` to every sink without waiting on consumers.
    pub fn publish(&self, snapshot: Arc<UnifiedConfiguration>) {
        if let Some(cache) = &self.query {
            cache.update(Arc::clone(&snapshot));
        }
        if let Some(slot) = &self.file {
            slot.send_replace(Some(snapshot));
        }
    }
}

pub struct Poller {
    aggregator: Aggregator,
    interval: Duration,
    sinks: Sinks,
    state: watch::Sender<SchedulerState>,
}

impl Poller {
    pub fn new(aggregator: Aggregator, interval: Duration, sinks: Sinks) -> Self {
        let (state, _) = watch::channel(SchedulerState::Idle);
        Self {
            aggregator,
            interval,
            sinks,
            state,
        }
    }

    /// Observe state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<SchedulerState> {
        self.state.subscribe()
    }

    /// Aggregate and publish one snapshot.
    pub async fn run_cycle(&self) -> Arc<UnifiedConfiguration> {
        let start = Instant::now();

        self.state.send_replace(SchedulerState::Aggregating);
        let snapshot = Arc::new(self.aggregator.aggregate().await);

        self.state.send_replace(SchedulerState::Publishing);
        self.sinks.publish(Arc::clone(&snapshot));

        metrics::record_cycle(start, snapshot.routers.len(), snapshot.services.len());
        tracing::info!(
            routers = snapshot.routers.len(),
            services = snapshot.services.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Aggregation completed"
        );

        self.state.send_replace(SchedulerState::Idle);
        snapshot
    }

    /// Run until `shutdown` fires. The first cycle starts immediately.
    ///
    /// A cycle that overruns the interval delays the next tick; cycles never
    /// overlap and are never cut short.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            upstreams = self.aggregator.upstream_count(),
            interval = ?self.interval,
            "Poller starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Poller received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        self.state.send_replace(SchedulerState::Terminated);
    }
}
