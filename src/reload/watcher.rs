//! Prefix file watcher for reload-on-change.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::reload::controller::ReloadController;

/// Quiet period after the last change event before reloading.
///
/// Editors and deploy tools tend to emit several events per save.
const DEBOUNCE: Duration = Duration::from_millis(500);

/// Watches the prefix list file and reloads the index when it changes.
pub struct FileWatcher {
    path: PathBuf,
    change_tx: mpsc::UnboundedSender<()>,
    change_rx: mpsc::UnboundedReceiver<()>,
}

impl FileWatcher {
    pub fn new(path: &Path) -> Self {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        Self {
            path: path.to_path_buf(),
            change_tx,
            change_rx,
        }
    }

    /// Start watching and spawn the task that applies reloads.
    ///
    /// The parent directory is watched rather than the file itself so that
    /// replace-by-rename updates are seen. The returned watcher must be kept
    /// alive for events to keep flowing.
    pub fn run(
        self,
        controller: Arc<ReloadController>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(RecommendedWatcher, JoinHandle<()>), notify::Error> {
        let tx = self.change_tx.clone();
        let file_name = self.path.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    let relevant = event.kind.is_modify() || event.kind.is_create();
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if relevant && ours {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let watch_target = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        watcher.watch(&watch_target, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Prefix file watcher started");

        let handle = tokio::spawn(apply_changes(self.change_rx, controller, shutdown));
        Ok((watcher, handle))
    }
}

async fn apply_changes(
    mut changes: mpsc::UnboundedReceiver<()>,
    controller: Arc<ReloadController>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            event = changes.recv() => {
                if event.is_none() {
                    break;
                }
                // Collapse a burst of events into one reload.
                loop {
                    match tokio::time::timeout(DEBOUNCE, changes.recv()).await {
                        Ok(Some(())) => continue,
                        Ok(None) | Err(_) => break,
                    }
                }
                tracing::info!("Prefix file change detected, reloading...");
                let _ = controller.reload().await;
            }
            _ = shutdown.recv() => {
                tracing::debug!("Prefix file watcher stopping");
                break;
            }
        }
    }
}
