//! Startup orchestration.
//!
//! Process states:
//! ```text
//! Starting ──(initial load + bind ok)──▶ Serving ──(SIGTERM/SIGINT)──▶ Stopped
//!     │                                     │
//!     └──(load or bind fails)──▶ Failed     └──(accept fails)──▶ Failed
//! ```
//! Reload successes and failures never move the process out of `Serving`.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ServerConfig;
use crate::lifecycle::{signals, Shutdown};
use crate::net::ListenerError;
use crate::net::Listener;
use crate::observability::metrics;
use crate::reload::{FileSource, FileWatcher, LoadError, ReloadController};
use crate::server::QueryServer;

/// Failures that stop the process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("initial load failed: {0}")]
    InitialLoad(#[from] LoadError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to watch prefix file: {0}")]
    Watch(#[from] notify::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Run until SIGTERM or SIGINT.
pub async fn run(config: ServerConfig) -> Result<(), ServerError> {
    run_until(config, signals::wait_for_termination()).await
}

/// Run until `stop` resolves, accept fails, or startup fails.
pub async fn run_until<F>(config: ServerConfig, stop: F) -> Result<(), ServerError>
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Some(addr) = config.metrics_address {
        metrics::init_metrics(addr);
    }

    let source = Arc::new(FileSource::new(&config.cidrs_path));
    let controller = Arc::new(ReloadController::initialize(source)?);

    let listener = Listener::bind(&config.socket_path, config.socket_mode)?;

    let shutdown = Shutdown::new();
    let mut background = Vec::new();

    if let Some(interval) = config.refresh_interval {
        background.push(controller.spawn_periodic(interval, shutdown.subscribe()));
    }

    let _watcher = if config.watch {
        let (watcher, handle) =
            FileWatcher::new(&config.cidrs_path).run(Arc::clone(&controller), shutdown.subscribe())?;
        background.push(handle);
        Some(watcher)
    } else {
        None
    };

    background.push(
        signals::spawn_reload_on_hangup(Arc::clone(&controller), shutdown.subscribe())
            .map_err(ServerError::Signal)?,
    );

    let server = QueryServer::new(controller);
    let tracker = server.tracker().clone();

    let outcome = tokio::select! {
        res = server.run(listener, &shutdown) => res.map_err(ServerError::from),
        res = stop => res.map_err(ServerError::Signal),
    };

    shutdown.trigger();
    if !tracker.wait_for_drain(config.drain_timeout).await {
        tracing::warn!(
            open_connections = tracker.active_count(),
            "Connections still open after drain timeout"
        );
    }
    for task in background {
        let _ = task.await;
    }

    match &outcome {
        Ok(()) => tracing::info!("Shutdown complete"),
        Err(e) => tracing::error!(error = %e, "Server stopped"),
    }
    outcome
}
