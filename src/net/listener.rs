//! Unix socket listener.
//!
//! # Responsibilities
//! - Replace a stale socket file left by a previous run
//! - Bind and set socket file permissions
//! - Accept incoming connections
//! - Remove the socket file when dropped

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to prepare or bind the socket path.
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to accept a connection.
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
}

/// A bound Unix socket that cleans up its path on drop.
#[derive(Debug)]
pub struct Listener {
    inner: UnixListener,
    path: PathBuf,
}

impl Listener {
    /// Bind `path`, replacing whatever a previous run left there.
    pub fn bind(path: &Path, mode: Option<u32>) -> Result<Self, ListenerError> {
        let bind_err = |source: std::io::Error| ListenerError::Bind {
            path: path.to_path_buf(),
            source,
        };

        match remove_stale(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed stale socket path"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(bind_err(e)),
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(bind_err)?;
            }
        }

        let inner = UnixListener::bind(path).map_err(bind_err)?;

        if let Some(mode) = mode {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .map_err(bind_err)?;
        }

        tracing::info!(path = %path.display(), mode = ?mode.map(|m| format!("{:o}", m)), "Listener bound");

        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Accept the next connection.
    pub async fn accept(&self) -> Result<UnixStream, ListenerError> {
        let (stream, _addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        Ok(stream)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Remove whatever sits at `path`, a whole directory tree included.
fn remove_stale(path: &Path) -> std::io::Result<()> {
    if std::fs::symlink_metadata(path)?.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
