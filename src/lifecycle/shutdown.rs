//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single "stop now" to every long-running task.
///
/// The accept loop, connection handlers and reload tasks each hold a
/// receiver. Keep this value alive for as long as the server runs: dropping
/// it closes the channel, which receivers also treat as shutdown.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call more than once.
    pub fn trigger(&self) {
        let receivers = self.tx.send(()).unwrap_or(0);
        tracing::debug!(receivers, "Shutdown triggered");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
