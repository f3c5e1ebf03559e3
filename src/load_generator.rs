use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::pool::{PoolError, TrackedPool};

// ─── Counters ────────────────────────────────────────────────────

/// Checkout outcomes of the current workload, read by the status endpoint.
#[derive(Debug, Default)]
pub struct LoadCounters {
    pub checkouts: AtomicU64,
    pub exhausted: AtomicU64,
}

impl LoadCounters {
    pub fn reset(&self) {
        self.checkouts.store(0, Ordering::Relaxed);
        self.exhausted.store(0, Ordering::Relaxed);
    }
}

// ─── Public entry point ──────────────────────────────────────────

/// Spawns `concurrency` Tokio tasks that borrow connections from `pool`
/// until the deadline or the `running` flag is set to false.
pub async fn run(
    running: Arc<AtomicBool>,
    counters: Arc<LoadCounters>,
    pool: Arc<TrackedPool>,
    concurrency: u32,
    duration_secs: u64,
    hold_ms: u64,
) {
    let deadline = Instant::now() + Duration::from_secs(duration_secs);

    let mut handles = Vec::with_capacity(concurrency as usize);

    for worker_id in 0..concurrency {
        let running = running.clone();
        let counters = counters.clone();
        let pool = pool.clone();

        handles.push(tokio::spawn(async move {
            worker(worker_id, running, counters, pool, deadline, hold_ms).await;
        }));
    }

    // Wait for all workers to finish
    for h in handles {
        let _ = h.await;
    }

    running.store(false, Ordering::SeqCst);
    info!(
        checkouts = counters.checkouts.load(Ordering::Relaxed),
        exhausted = counters.exhausted.load(Ordering::Relaxed),
        "Synthetic workload finished"
    );
}

// ─── Worker loop ─────────────────────────────────────────────────

async fn worker(
    id: u32,
    running: Arc<AtomicBool>,
    counters: Arc<LoadCounters>,
    pool: Arc<TrackedPool>,
    deadline: Instant,
    hold_ms: u64,
) {
    // Each worker gets its own deterministic RNG seeded uniquely.
    let mut rng = StdRng::seed_from_u64(1000 + id as u64);

    while running.load(Ordering::Relaxed) && Instant::now() < deadline {
        // Hold for 50–150 % of the configured time
        let hold = Duration::from_millis(rng.gen_range(hold_ms / 2..=hold_ms * 3 / 2));
        let pause = Duration::from_millis(rng.gen_range(0..=hold_ms));

        match pool.checkout() {
            Ok(conn) => {
                counters.checkouts.fetch_add(1, Ordering::Relaxed);
                tokio::time::sleep(hold).await;
                drop(conn);
            }
            Err(PoolError::Exhausted { in_use, limit }) => {
                counters.exhausted.fetch_add(1, Ordering::Relaxed);
                debug!(worker = id, in_use, limit, "Pool exhausted, backing off");
            }
            Err(e) => {
                debug!(worker = id, error = %e, "Checkout failed");
            }
        }

        tokio::time::sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::PoolHandle;

    #[tokio::test]
    async fn workers_return_every_connection() {
        let pool = Arc::new(TrackedPool::new(2, 1));
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(LoadCounters::default());

        let handle = tokio::spawn(run(
            running.clone(),
            counters.clone(),
            pool.clone(),
            6,
            60,
            5,
        ));

        tokio::time::sleep(Duration::from_millis(100)).await;
        running.store(false, Ordering::SeqCst);
        handle.await.unwrap();

        assert!(counters.checkouts.load(Ordering::Relaxed) > 0);
        let reading = pool.read().unwrap();
        assert_eq!(reading.checked_out, 0);
        assert!(reading.overflow <= 0);
    }
}
