use thiserror::Error;

use crate::pool::PoolError;

/// A single sampling tick failed. The loop logs it and tries again on the
/// next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    #[error("failed to read pool: {0}")]
    PoolUnavailable(#[from] PoolError),
}

/// Errors returned to callers of the monitor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Pool monitoring not available")]
    NotStarted,

    #[error("history window must be >= 0 minutes, got {0}")]
    InvalidWindow(i64),

    #[error("sampling interval must be greater than zero")]
    InvalidInterval,

    #[error(transparent)]
    Sample(#[from] SampleError),
}

/// Configuration errors, reported once at startup.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("invalid bind address '{addr}': {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
