//! Latest-snapshot holder shared between the poller and the query handlers.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::dynamic::UnifiedConfiguration;

/// Lock-free holder of the most recent snapshot.
///
/// Readers always observe a complete snapshot: updates swap the whole `Arc`.
/// Starts out holding an empty configuration.
#[derive(Clone)]
pub struct SnapshotCache {
    inner: Arc<ArcSwap<UnifiedConfiguration>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(UnifiedConfiguration::default())),
        }
    }

    /// Replace the held snapshot.
    pub fn update(&self, snapshot: Arc<UnifiedConfiguration>) {
        self.inner.store(snapshot);
    }

    /// The current snapshot. Never waits on an aggregation in progress.
    pub fn read(&self) -> Arc<UnifiedConfiguration> {
        self.inner.load_full()
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}
