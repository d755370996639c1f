//! Stop signal shared by the poller, the file sink and the query server.
//!
//! On trigger the poller finishes and publishes its in-flight cycle, the
//! file sink leaves its loop without a final write, and the query server
//! stops accepting connections and drains open ones.

use tokio::sync::broadcast;

/// One-shot stop broadcast.
///
/// Every long-running task takes its own receiver at spawn time; a trigger
/// with no receivers left is ignored.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for one task.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Tell every subscribed task to stop.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
