//! Current-index slot and reload orchestration.
//!
//! # Responsibilities
//! - Hold the published snapshot behind an atomic pointer
//! - Rebuild from the source off to the side, then publish in one swap
//! - Keep the old snapshot when a reload fails
//! - Drive periodic reloads on a timer

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::index::{ParseStats, PrefixIndex};
use crate::observability::metrics;
use crate::reload::source::{LoadError, PrefixSource};

/// A published, immutable index together with its generation number.
#[derive(Debug)]
pub struct Snapshot {
    /// Sequence number of the load that produced this snapshot (first load = 1).
    pub generation: u64,
    /// Line counts from parsing the source.
    pub stats: ParseStats,
    pub index: PrefixIndex,
}

impl Snapshot {
    pub fn contains(&self, addr: &str) -> bool {
        self.index.contains(addr)
    }
}

/// Owns the current prefix index and replaces it on reload.
///
/// Readers call [`ReloadController::current_index`] and get an `Arc` to a
/// complete snapshot. A reload never blocks readers and readers never block
/// a reload.
#[derive(Debug)]
pub struct ReloadController {
    source: Arc<dyn PrefixSource>,
    current: ArcSwap<Snapshot>,
    next_generation: AtomicU64,
}

impl ReloadController {
    /// Perform the initial load synchronously.
    ///
    /// Fails if the source cannot be read; there is nothing to serve without
    /// a first index.
    pub fn initialize(source: Arc<dyn PrefixSource>) -> Result<Self, LoadError> {
        let started = Instant::now();
        let snapshot = match build_snapshot(source.as_ref(), 1) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(source = %source.describe(), error = %e, "Initial prefix load failed");
                metrics::record_reload("failure");
                return Err(e);
            }
        };

        log_loaded("Initial prefix list loaded", source.as_ref(), &snapshot, started);
        metrics::record_reload("success");
        metrics::record_index_size(&snapshot.index);

        Ok(Self {
            source,
            current: ArcSwap::from_pointee(snapshot),
            next_generation: AtomicU64::new(2),
        })
    }

    /// The snapshot future queries should use.
    pub fn current_index(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    /// Convenience: query the current snapshot.
    pub fn contains(&self, addr: &str) -> bool {
        self.current.load().contains(addr)
    }

    /// Origin of the prefix list, for logs.
    pub fn source_description(&self) -> String {
        self.source.describe()
    }

    /// Read the source, build a new index and publish it.
    ///
    /// On failure the current snapshot stays in place.
    pub fn load(&self) -> Result<Arc<Snapshot>, LoadError> {
        let started = Instant::now();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let snapshot = match build_snapshot(self.source.as_ref(), generation) {
            Ok(snapshot) => Arc::new(snapshot),
            Err(e) => {
                tracing::error!(
                    source = %self.source.describe(),
                    error = %e,
                    "Failed to reload prefix list. Keeping current index."
                );
                metrics::record_reload("failure");
                return Err(e);
            }
        };

        self.publish(Arc::clone(&snapshot));
        log_loaded("Prefix list reloaded", self.source.as_ref(), &snapshot, started);
        metrics::record_reload("success");
        metrics::record_index_size(&snapshot.index);

        Ok(snapshot)
    }

    /// Run [`ReloadController::load`] on the blocking pool.
    pub async fn reload(self: &Arc<Self>) -> Result<Arc<Snapshot>, LoadError> {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.load()).await?
    }

    /// Swap in `snapshot` unless a newer generation is already published.
    ///
    /// Two overlapping reloads may finish out of order; the one that started
    /// later read the fresher source and wins.
    fn publish(&self, snapshot: Arc<Snapshot>) {
        self.current.rcu(|current| {
            if current.generation > snapshot.generation {
                Arc::clone(current)
            } else {
                Arc::clone(&snapshot)
            }
        });
    }

    /// Reload every `interval` until `shutdown` fires.
    ///
    /// The first reload happens one full interval after this is called.
    /// Failures are logged and the timer keeps running.
    pub fn spawn_periodic(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);

        tokio::spawn(async move {
            let Some(start) = time::Instant::now().checked_add(interval) else {
                tracing::warn!(
                    interval_secs = interval.as_secs(),
                    "Refresh interval out of range. Periodic reload disabled."
                );
                return;
            };

            tracing::info!(
                interval_secs = interval.as_secs(),
                source = %this.source.describe(),
                "Periodic reload armed"
            );

            let mut ticker = time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        // Errors are already logged inside load().
                        let _ = this.reload().await;
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("Periodic reload stopping");
                        break;
                    }
                }
            }
        })
    }
}

fn build_snapshot(source: &dyn PrefixSource, generation: u64) -> Result<Snapshot, LoadError> {
    let text = source.read()?;
    let (index, stats) = PrefixIndex::parse_lines(&text);
    Ok(Snapshot { generation, stats, index })
}

fn log_loaded(message: &str, source: &dyn PrefixSource, snapshot: &Snapshot, started: Instant) {
    tracing::info!(
        source = %source.describe(),
        generation = snapshot.generation,
        v4_prefixes = snapshot.index.v4_len(),
        v6_prefixes = snapshot.index.v6_len(),
        skipped_lines = snapshot.stats.skipped,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{}",
        message
    );
}
