//! Configuration schema definitions.
//!
//! `FileConfig` mirrors the optional TOML file, where every key may be
//! absent. `ServerConfig` is the validated result after the file and the
//! command line have been merged.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Contents of the optional TOML configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Unix socket path to listen on.
    pub socket: Option<PathBuf>,

    /// Prefix list file.
    pub cidrs: Option<PathBuf>,

    /// Periodic reload interval in whole hours. 0 disables.
    pub refresh_hours: Option<u64>,

    /// Reload when the prefix list file changes.
    pub watch: Option<bool>,

    /// Permissions applied to the socket file after bind.
    pub socket_mode: Option<u32>,

    /// Prometheus scrape endpoint (e.g., "127.0.0.1:9187").
    pub metrics_address: Option<String>,

    /// Seconds to wait for open connections to finish on shutdown.
    pub drain_timeout_secs: Option<u64>,
}

/// Fully resolved server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    pub cidrs_path: PathBuf,
    /// `None` when periodic reload is disabled.
    pub refresh_interval: Option<Duration>,
    pub watch: bool,
    /// `None` leaves the permissions the process umask produced.
    pub socket_mode: Option<u32>,
    pub metrics_address: Option<SocketAddr>,
    pub drain_timeout: Duration,
}

impl ServerConfig {
    /// Default time allowed for connections to finish after shutdown is signalled.
    pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

    /// Minimal configuration: no periodic reload, no watcher, no metrics.
    pub fn new(socket_path: impl Into<PathBuf>, cidrs_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            cidrs_path: cidrs_path.into(),
            refresh_interval: None,
            watch: false,
            socket_mode: None,
            metrics_address: None,
            drain_timeout: Self::DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

/// Convert a whole-hour refresh setting into an interval. 0 disables.
pub fn refresh_interval(hours: u64) -> Option<Duration> {
    (hours > 0).then(|| Duration::from_secs(hours.saturating_mul(3600)))
}
