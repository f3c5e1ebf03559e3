use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::pool::PoolReading;

/// One immutable point-in-time measurement of pool state.
///
/// The two percentages are derived in [`PoolSample::new`] and never set on
/// their own, so they always agree with the counters they were built from.
/// Serializes as a flat JSON object with the timestamp in fractional unix
/// seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoolSample {
    active_connections: u32,
    idle_connections: u32,
    total_connections: u32,
    pool_size: u32,
    max_overflow: u32,
    overflow: i64,
    #[serde(serialize_with = "unix_seconds")]
    timestamp: DateTime<Utc>,
    pool_usage_percent: f64,
    overflow_usage_percent: f64,
}

impl PoolSample {
    /// Build a sample from a pool reading captured at `timestamp`.
    pub fn new(reading: PoolReading, timestamp: DateTime<Utc>) -> Self {
        Self {
            active_connections: reading.checked_out,
            idle_connections: reading.checked_in,
            total_connections: reading.size,
            pool_size: reading.size,
            max_overflow: reading.max_overflow,
            overflow: reading.overflow,
            timestamp,
            pool_usage_percent: round_to(
                usage_percent(reading.checked_out, reading.size),
                2,
            ),
            overflow_usage_percent: round_to(
                overflow_percent(reading.overflow, reading.max_overflow),
                2,
            ),
        }
    }

    pub fn active_connections(&self) -> u32 {
        self.active_connections
    }

    pub fn idle_connections(&self) -> u32 {
        self.idle_connections
    }

    pub fn total_connections(&self) -> u32 {
        self.total_connections
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub fn max_overflow(&self) -> u32 {
        self.max_overflow
    }

    pub fn overflow(&self) -> i64 {
        self.overflow
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn pool_usage_percent(&self) -> f64 {
        self.pool_usage_percent
    }

    pub fn overflow_usage_percent(&self) -> f64 {
        self.overflow_usage_percent
    }
}

// ─── Derived metrics ─────────────────────────────────────────────

/// `active / pool_size * 100`, or 0 for an empty pool.
pub fn usage_percent(active: u32, pool_size: u32) -> f64 {
    if pool_size == 0 {
        return 0.0;
    }
    f64::from(active) / f64::from(pool_size) * 100.0
}

/// `overflow / max_overflow * 100`. A pool configured without overflow
/// reports 0 rather than dividing by a clamped denominator.
pub fn overflow_percent(overflow: i64, max_overflow: u32) -> f64 {
    if max_overflow == 0 {
        return 0.0;
    }
    overflow as f64 / f64::from(max_overflow) * 100.0
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub(crate) fn unix_seconds<S: Serializer>(
    ts: &DateTime<Utc>,
    s: S,
) -> Result<S::Ok, S::Error> {
    let secs = ts.timestamp() as f64
        + f64::from(ts.timestamp_subsec_micros()) / 1_000_000.0;
    s.serialize_f64(secs)
}
