//! OS signal handling.
//!
//! - SIGTERM / SIGINT → graceful shutdown
//! - SIGHUP → immediate reload of the prefix list

use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::reload::ReloadController;

/// Resolve when SIGTERM or SIGINT arrives.
pub async fn wait_for_termination() -> std::io::Result<()> {
    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = term.recv() => tracing::info!("SIGTERM received"),
        _ = int.recv() => tracing::info!("SIGINT received"),
    }
    Ok(())
}

/// Reload the prefix list on every SIGHUP until `shutdown` fires.
pub fn spawn_reload_on_hangup(
    controller: Arc<ReloadController>,
    mut shutdown: broadcast::Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    let mut hup = signal(SignalKind::hangup())?;

    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                received = hup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    tracing::info!("SIGHUP received, reloading prefix list");
                    let _ = controller.reload().await;
                }
                _ = shutdown.recv() => break,
            }
        }
    }))
}
