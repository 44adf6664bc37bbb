//! Configuration loading and merging.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::config::cli::CliArgs;
use crate::config::schema::{refresh_interval, FileConfig, ServerConfig};
use crate::config::validation::{validate, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl ConfigError {
    /// Whether the failure is only about required settings being absent.
    ///
    /// The caller prints usage in that case.
    pub fn is_missing_required(&self) -> bool {
        matches!(self, ConfigError::Validation(errors)
            if errors.iter().all(|e| matches!(e, ValidationError::Missing(_))))
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    let parts: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("invalid configuration: {}", parts.join(", "))
}

/// Read a TOML config file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Resolve the final configuration from the command line and, if named,
/// a config file. Command-line values take precedence.
pub fn resolve(args: &CliArgs) -> Result<ServerConfig, ConfigError> {
    let file = match &args.config {
        Some(path) => load_file(path)?,
        None => FileConfig::default(),
    };
    merge(args, file)
}

/// Overlay `args` on `file` and validate the result.
pub fn merge(args: &CliArgs, file: FileConfig) -> Result<ServerConfig, ConfigError> {
    let merged = FileConfig {
        socket: args.socket.clone().or(file.socket),
        cidrs: args.cidrs.clone().or(file.cidrs),
        refresh_hours: args.refresh.or(file.refresh_hours),
        watch: Some(args.watch || file.watch.unwrap_or(false)),
        socket_mode: args.socket_mode.or(file.socket_mode),
        metrics_address: args.metrics_address.clone().or(file.metrics_address),
        drain_timeout_secs: file.drain_timeout_secs,
    };

    validate(&merged).map_err(ConfigError::Validation)?;

    let socket_path = merged
        .socket
        .ok_or_else(|| ConfigError::Validation(vec![ValidationError::Missing("socket")]))?;
    let cidrs_path = merged
        .cidrs
        .ok_or_else(|| ConfigError::Validation(vec![ValidationError::Missing("cidrs")]))?;

    Ok(ServerConfig {
        socket_path,
        cidrs_path,
        refresh_interval: refresh_interval(merged.refresh_hours.unwrap_or(0)),
        watch: merged.watch.unwrap_or(false),
        socket_mode: merged.socket_mode,
        metrics_address: merged.metrics_address.and_then(|a| a.parse().ok()),
        drain_timeout: merged
            .drain_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(ServerConfig::DEFAULT_DRAIN_TIMEOUT),
    })
}
