use parking_lot::Mutex;

use super::{PoolError, PoolHandle, PoolReading};

// ─── Public types ────────────────────────────────────────────────

/// In-process queue pool that only tracks connection accounting.
///
/// Mirrors the counters of a classic queue pool: `size` base slots that are
/// opened lazily and kept around once opened, plus up to `max_overflow`
/// extra connections that are discarded as soon as they are returned.
/// `overflow` therefore starts at `-size` and only turns positive when the
/// pool is borrowing beyond its base size.
pub struct TrackedPool {
    size: u32,
    max_overflow: u32,
    inner: Mutex<Counters>,
}

/// RAII guard for a checked-out connection; dropping it checks the
/// connection back in.
pub struct PooledConnection<'a> {
    pool: &'a TrackedPool,
}

// ─── Internal state ──────────────────────────────────────────────

#[derive(Debug, Default)]
struct Counters {
    /// Connections that exist right now (idle + in use)
    opened: u32,
    /// Opened connections waiting in the pool
    idle: u32,
    closed: bool,
}

// ─── TrackedPool impl ────────────────────────────────────────────

impl TrackedPool {
    pub fn new(size: u32, max_overflow: u32) -> Self {
        Self {
            size,
            max_overflow,
            inner: Mutex::new(Counters::default()),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn max_overflow(&self) -> u32 {
        self.max_overflow
    }

    /// Borrow a connection, reusing an idle one when possible.
    pub fn checkout(&self) -> Result<PooledConnection<'_>, PoolError> {
        let mut c = self.inner.lock();
        if c.closed {
            return Err(PoolError::Unavailable("pool is closed".into()));
        }

        if c.idle > 0 {
            c.idle -= 1;
        } else {
            let limit = self.size + self.max_overflow;
            if c.opened >= limit {
                return Err(PoolError::Exhausted {
                    in_use: c.opened,
                    limit,
                });
            }
            c.opened += 1;
        }

        Ok(PooledConnection { pool: self })
    }

    /// Stop handing out connections; reads fail until `reopen`.
    pub fn close(&self) {
        self.inner.lock().closed = true;
    }

    pub fn reopen(&self) {
        self.inner.lock().closed = false;
    }

    fn checkin(&self) {
        let mut c = self.inner.lock();
        if c.opened > self.size {
            // Overflow connections are never kept
            c.opened -= 1;
        } else {
            c.idle += 1;
        }
    }
}

impl PoolHandle for TrackedPool {
    fn read(&self) -> Result<PoolReading, PoolError> {
        let c = self.inner.lock();
        if c.closed {
            return Err(PoolError::Unavailable("pool is closed".into()));
        }

        Ok(PoolReading {
            checked_out: c.opened - c.idle,
            checked_in: c.idle,
            size: self.size,
            overflow: i64::from(c.opened) - i64::from(self.size),
            max_overflow: self.max_overflow,
        })
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        self.pool.checkin();
    }
}
