//! Prefix list sources.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while loading a prefix list.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The source could not be opened or read.
    #[error("prefix source {origin} unavailable: {source}")]
    SourceUnavailable {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    /// The blocking reload task panicked or was cancelled.
    #[error("reload task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Something a prefix list can be read from.
///
/// Implementations return the full text; parsing happens in the index.
pub trait PrefixSource: Send + Sync + fmt::Debug + 'static {
    /// Read the whole prefix list.
    fn read(&self) -> Result<String, LoadError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// A prefix list stored in a text file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PrefixSource for FileSource {
    fn read(&self) -> Result<String, LoadError> {
        std::fs::read_to_string(&self.path).map_err(|source| LoadError::SourceUnavailable {
            origin: self.describe(),
            source,
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
