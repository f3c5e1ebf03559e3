//! Connection-pool monitor: a background sampler feeding a bounded history,
//! plus the read-side facade used by the HTTP handlers.

pub mod health;
pub mod history;
pub mod sample;
pub mod summary;

pub use health::{HealthReport, HealthStatus, UsageTier};
pub use history::{History, DEFAULT_MAX_HISTORY};
pub use sample::PoolSample;
pub use summary::{HistorySummary, PercentileSet};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{MonitorError, Result, SampleError};
use crate::pool::PoolHandle;

// ─── Sampler ─────────────────────────────────────────────────────

/// Turns one pool read into one [`PoolSample`].
#[derive(Clone)]
pub struct Sampler {
    pool: Arc<dyn PoolHandle>,
}

impl Sampler {
    pub fn new(pool: Arc<dyn PoolHandle>) -> Self {
        Self { pool }
    }

    /// Read the pool right now.
    pub fn sample_now(&self) -> Result<PoolSample, SampleError> {
        let reading = self.pool.read()?;
        Ok(PoolSample::new(reading, Utc::now()))
    }

    /// One loop iteration: sample, append, log. Failures are logged and the
    /// tick is skipped.
    fn tick(&self, history: &History) {
        let sample = match self.sample_now() {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Pool monitoring error");
                return;
            }
        };

        history.append(sample.clone());
        log_sample(&sample);
    }
}

fn log_sample(s: &PoolSample) {
    debug!(
        active = s.active_connections(),
        idle = s.idle_connections(),
        total = s.total_connections(),
        overflow = s.overflow(),
        "Pool stats"
    );

    let usage = s.pool_usage_percent();
    match UsageTier::classify(usage) {
        UsageTier::Critical => error!(
            active = s.active_connections(),
            pool_size = s.pool_size(),
            usage_percent = usage,
            "Critical pool usage"
        ),
        UsageTier::High => warn!(
            active = s.active_connections(),
            pool_size = s.pool_size(),
            usage_percent = usage,
            "High pool usage"
        ),
        UsageTier::Nominal => {}
    }
}

// ─── PoolMonitor ─────────────────────────────────────────────────

/// Owns the history and the sampling task. Construct one per process and
/// share it by `Arc`.
pub struct PoolMonitor {
    sampler: Sampler,
    history: Arc<History>,
    /// Set on the first successful `run`, never cleared
    started: AtomicBool,
    task: Mutex<Option<SamplerTask>>,
}

struct SamplerTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl PoolMonitor {
    pub fn new(pool: Arc<dyn PoolHandle>, max_history: usize) -> Self {
        Self {
            sampler: Sampler::new(pool),
            history: Arc::new(History::new(max_history)),
            started: AtomicBool::new(false),
            task: Mutex::new(None),
        }
    }

    /// Start the background sampling task on the current tokio runtime.
    ///
    /// The first sample is taken immediately. Returns `Ok(false)` when the
    /// task is already running.
    pub fn run(&self, interval: Duration) -> Result<bool> {
        if interval.is_zero() {
            return Err(MonitorError::InvalidInterval);
        }

        let mut task = self.task.lock();
        if task.is_some() {
            return Ok(false);
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sampling_loop(
            self.sampler.clone(),
            Arc::clone(&self.history),
            interval,
            cancel.clone(),
        ));
        *task = Some(SamplerTask { cancel, handle });
        self.started.store(true, Ordering::SeqCst);

        info!(interval_secs = interval.as_secs_f64(), "Pool monitoring started");
        Ok(true)
    }

    /// Ask the sampling task to exit and wait for it.
    ///
    /// A sample already in flight completes first. Calling this while idle
    /// does nothing.
    pub async fn stop(&self) {
        let task = self.task.lock().take();
        let Some(task) = task else {
            return;
        };

        task.cancel.cancel();
        // JoinError only means the task already went away
        let _ = task.handle.await;
        info!("Pool monitoring stopped");
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Fresh read of the pool, bypassing the history.
    pub fn current_stats(&self) -> Result<PoolSample> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(MonitorError::NotStarted);
        }
        Ok(self.sampler.sample_now()?)
    }

    /// Samples captured during the last `window_minutes`. A zero window is
    /// empty, not unbounded.
    pub fn history(&self, window_minutes: i64) -> Result<Vec<PoolSample>> {
        if window_minutes < 0 {
            return Err(MonitorError::InvalidWindow(window_minutes));
        }
        if window_minutes == 0 {
            return Ok(Vec::new());
        }

        let cutoff = TimeDelta::try_minutes(window_minutes)
            .and_then(|w| Utc::now().checked_sub_signed(w))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Ok(self.history.snapshot_since(cutoff))
    }

    pub fn summary(&self, window_minutes: i64) -> Result<HistorySummary> {
        let samples = self.history(window_minutes)?;
        Ok(HistorySummary::from_samples(window_minutes, &samples))
    }

    /// Health of the pool right now.
    pub fn health(&self) -> Result<HealthReport> {
        Ok(HealthReport::assess(&self.current_stats()?))
    }

    pub fn latest(&self) -> Option<PoolSample> {
        self.history.latest()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}

impl Drop for PoolMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

async fn sampling_loop(
    sampler: Sampler,
    history: Arc<History>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => sampler.tick(&history),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::TrackedPool;

    fn monitor(pool: &Arc<TrackedPool>, max_history: usize) -> PoolMonitor {
        PoolMonitor::new(pool.clone(), max_history)
    }

    #[tokio::test]
    async fn unstarted_monitor_is_unavailable() {
        let pool = Arc::new(TrackedPool::new(10, 5));
        let m = monitor(&pool, 10);

        assert_eq!(m.current_stats(), Err(MonitorError::NotStarted));
        assert_eq!(m.health().err(), Some(MonitorError::NotStarted));
        assert!(!m.is_running());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let pool = Arc::new(TrackedPool::new(10, 5));
        let m = monitor(&pool, 10);

        assert_eq!(m.run(Duration::ZERO), Err(MonitorError::InvalidInterval));
        assert!(!m.is_running());
    }

    #[tokio::test]
    async fn run_samples_immediately_and_twice_is_noop() {
        let pool = Arc::new(TrackedPool::new(10, 5));
        let _conn = pool.checkout().unwrap();
        let m = monitor(&pool, 10);

        assert_eq!(m.run(Duration::from_secs(3600)), Ok(true));
        assert_eq!(m.run(Duration::from_secs(3600)), Ok(false));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(m.history_len(), 1);
        assert_eq!(m.latest().map(|s| s.active_connections()), Some(1));

        m.stop().await;
        assert!(!m.is_running());
    }

    #[tokio::test]
    async fn current_stats_reads_live_state() {
        let pool = Arc::new(TrackedPool::new(10, 5));
        let m = monitor(&pool, 10);
        m.run(Duration::from_secs(3600)).unwrap();

        let a = pool.checkout().unwrap();
        let b = pool.checkout().unwrap();
        assert_eq!(m.current_stats().unwrap().active_connections(), 2);
        drop((a, b));
        assert_eq!(m.current_stats().unwrap().active_connections(), 0);

        // Still available after stop: the monitor was started once
        m.stop().await;
        assert!(m.current_stats().is_ok());
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_freezes_history() {
        let pool = Arc::new(TrackedPool::new(4, 0));
        let m = monitor(&pool, 100);

        m.stop().await;
        m.run(Duration::from_millis(10)).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        m.stop().await;
        m.stop().await;

        let frozen = m.history(60).unwrap();
        assert!(!frozen.is_empty());
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(m.history(60).unwrap(), frozen);
    }

    #[tokio::test]
    async fn failing_ticks_do_not_kill_the_loop() {
        let pool = Arc::new(TrackedPool::new(4, 0));
        let m = monitor(&pool, 100);

        pool.close();
        m.run(Duration::from_millis(10)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(m.history_len(), 0);
        assert!(matches!(
            m.current_stats(),
            Err(MonitorError::Sample(SampleError::PoolUnavailable(_)))
        ));

        pool.reopen();
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(m.history_len() > 0);
        assert!(m.is_running());
        m.stop().await;
    }

    #[tokio::test]
    async fn history_windows() {
        let pool = Arc::new(TrackedPool::new(4, 0));
        let m = monitor(&pool, 100);
        m.run(Duration::from_secs(3600)).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(m.history(0).unwrap(), Vec::new());
        assert_eq!(m.history(-1), Err(MonitorError::InvalidWindow(-1)));
        assert_eq!(m.history(1).unwrap().len(), 1);
        assert_eq!(m.history(i64::MAX).unwrap().len(), 1);

        m.stop().await;
    }
}
