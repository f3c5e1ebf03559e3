//! Command-line / environment configuration and logging setup.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;
use crate::monitor::DEFAULT_MAX_HISTORY;

/// Sampling interval when nothing else is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 60;
/// Faster sampling used in debug mode.
pub const DEBUG_INTERVAL_SECS: u64 = 5;

/// Connection-pool diagnostics service.
#[derive(Parser, Debug, Clone)]
#[command(name = "pool-xray")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Seconds between pool samples [default: 60, or 5 with --debug]
    #[arg(long, env = "POOL_XRAY_INTERVAL_SECS")]
    pub interval_secs: Option<u64>,

    /// Number of samples kept in memory
    #[arg(long, env = "POOL_XRAY_MAX_HISTORY", default_value_t = DEFAULT_MAX_HISTORY)]
    pub max_history: usize,

    /// Development mode: faster sampling, debug logging
    #[arg(long, env = "POOL_XRAY_DEBUG")]
    pub debug: bool,

    /// Address the HTTP server listens on
    #[arg(long, env = "POOL_XRAY_BIND", default_value = "0.0.0.0:3000")]
    pub bind: String,

    /// Base size of the monitored pool
    #[arg(long, env = "POOL_XRAY_POOL_SIZE", default_value_t = 10)]
    pub pool_size: u32,

    /// Extra connections the pool may open beyond its base size
    #[arg(long, env = "POOL_XRAY_MAX_OVERFLOW", default_value_t = 5)]
    pub max_overflow: u32,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, env = "POOL_XRAY_LOG_LEVEL")]
    pub log_level: Option<String>,

    #[arg(long, value_enum, env = "POOL_XRAY_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Validated settings for the monitor and the server around it.
#[derive(Debug, Clone)]
pub struct Config {
    pub interval: Duration,
    pub max_history: usize,
    pub bind: SocketAddr,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, ConfigError> {
        let interval_secs = self.interval_secs.unwrap_or(if self.debug {
            DEBUG_INTERVAL_SECS
        } else {
            DEFAULT_INTERVAL_SECS
        });
        if interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "interval_secs",
                reason: "must be greater than zero".into(),
            });
        }

        if self.max_history == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_history",
                reason: "must keep at least one sample".into(),
            });
        }

        let bind = self.bind.parse().map_err(|source| ConfigError::Bind {
            addr: self.bind.clone(),
            source,
        })?;

        let level = self
            .log_level
            .unwrap_or_else(|| if self.debug { "debug" } else { "info" }.into());

        Ok(Config {
            interval: Duration::from_secs(interval_secs),
            max_history: self.max_history,
            bind,
            pool_size: self.pool_size,
            max_overflow: self.max_overflow,
            logging: LoggingConfig {
                level,
                format: self.log_format,
            },
        })
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format {
            LogFormat::Json => fmt().json().with_env_filter(filter).init(),
            LogFormat::Pretty => fmt().with_env_filter(filter).init(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
        }
    }
}
