//! Query server accept loop.
//!
//! # Responsibilities
//! - Accept connections on the bound listener
//! - Spawn one handler task per connection without waiting on it
//! - Treat accept failure as fatal
//! - Stop accepting when shutdown is signalled

use std::sync::Arc;

use crate::lifecycle::Shutdown;
use crate::net::{handle_connection, ConnectionTracker, Listener, ListenerError};
use crate::reload::ReloadController;

/// Serves containment queries against the controller's current index.
pub struct QueryServer {
    controller: Arc<ReloadController>,
    tracker: ConnectionTracker,
}

impl QueryServer {
    pub fn new(controller: Arc<ReloadController>) -> Self {
        Self {
            controller,
            tracker: ConnectionTracker::new(),
        }
    }

    /// Open-connection tracker, for draining on shutdown.
    pub fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    /// Accept until `shutdown` fires or accept fails.
    ///
    /// Handlers already running keep going until their peer closes or they
    /// see the same shutdown signal. The listener (and its socket file) is
    /// released when this returns.
    pub async fn run(&self, listener: Listener, shutdown: &Shutdown) -> Result<(), ListenerError> {
        let mut stop = shutdown.subscribe();

        tracing::info!(
            path = %listener.path().display(),
            source = %self.controller.source_description(),
            "Query server accepting connections"
        );

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let stream = match accepted {
                        Ok(stream) => stream,
                        Err(e) => {
                            tracing::error!(error = %e, "Accept failed");
                            return Err(e);
                        }
                    };

                    let guard = self.tracker.track();
                    let controller = Arc::clone(&self.controller);
                    let conn_shutdown = shutdown.subscribe();

                    tokio::spawn(async move {
                        let id = guard.id();
                        tracing::debug!(connection_id = %id, "Connection started");

                        match handle_connection(stream, controller, conn_shutdown).await {
                            Ok(queries) => {
                                tracing::debug!(connection_id = %id, queries, "Connection ended");
                            }
                            Err(e) => {
                                tracing::debug!(connection_id = %id, error = %e, "Connection ended with error");
                            }
                        }
                        drop(guard);
                    });
                }
                _ = stop.recv() => {
                    tracing::info!("Query server stopped accepting");
                    break;
                }
            }
        }

        Ok(())
    }
}
