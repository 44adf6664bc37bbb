//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Runs on the merged file + command-line settings

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::FileConfig;

/// Ten years. Longer intervals overflow the runtime clock.
pub const MAX_REFRESH_HOURS: u64 = 24 * 365 * 10;

pub const MAX_DRAIN_TIMEOUT_SECS: u64 = 3600;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("socket_mode {0:o} is not a permission mode")]
    BadSocketMode(u32),

    #[error("metrics_address {0:?} is not a socket address")]
    BadMetricsAddress(String),

    #[error("refresh_hours {0} exceeds the maximum of {max}", max = MAX_REFRESH_HOURS)]
    RefreshTooLong(u64),

    #[error("drain_timeout_secs {0} exceeds the maximum of {max}", max = MAX_DRAIN_TIMEOUT_SECS)]
    DrainTooLong(u64),
}

pub fn validate(config: &FileConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.socket.as_ref().map_or(true, |p| p.as_os_str().is_empty()) {
        errors.push(ValidationError::Missing("socket"));
    }
    if config.cidrs.as_ref().map_or(true, |p| p.as_os_str().is_empty()) {
        errors.push(ValidationError::Missing("cidrs"));
    }
    if let Some(mode) = config.socket_mode {
        if mode > 0o777 {
            errors.push(ValidationError::BadSocketMode(mode));
        }
    }
    if let Some(hours) = config.refresh_hours {
        if hours > MAX_REFRESH_HOURS {
            errors.push(ValidationError::RefreshTooLong(hours));
        }
    }
    if let Some(secs) = config.drain_timeout_secs {
        if secs > MAX_DRAIN_TIMEOUT_SECS {
            errors.push(ValidationError::DrainTooLong(secs));
        }
    }
    if let Some(addr) = &config.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::BadMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
