pub mod tracked;

pub use tracked::{PooledConnection, TrackedPool};

use thiserror::Error;

/// Errors a pool handle can report back to the monitor or to a borrower.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PoolError {
    /// The handle could not be read right now (closed, disposed, poisoned).
    #[error("pool handle unavailable: {0}")]
    Unavailable(String),

    /// Every base and overflow slot is already checked out.
    #[error("pool exhausted: {in_use} connections checked out (limit {limit})")]
    Exhausted { in_use: u32, limit: u32 },
}

/// One consistent read of a connection pool's counters.
///
/// Implementations must produce all five values from the same instant so a
/// sample never mixes counters from two different pool states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolReading {
    /// Connections currently handed out to callers
    pub checked_out: u32,
    /// Connections sitting in the pool, ready to be borrowed
    pub checked_in: u32,
    /// Pool size at read time
    pub size: u32,
    /// Connections borrowed beyond the base size (may go negative)
    pub overflow: i64,
    /// Configured overflow allowance
    pub max_overflow: u32,
}

/// The capability set the monitor needs from a connection pool.
///
/// The read is expected to be a fast, in-memory operation. An implementation
/// that can block (network round-trip, foreign lock) must wrap its call so it
/// returns promptly; the sampling task never applies a timeout of its own.
pub trait PoolHandle: Send + Sync + 'static {
    fn read(&self) -> Result<PoolReading, PoolError>;
}
