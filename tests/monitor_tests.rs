use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use pool_xray::error::MonitorError;
use pool_xray::monitor::{HealthReport, HealthStatus, History, PoolMonitor, PoolSample, UsageTier};
use pool_xray::pool::{PoolError, PoolHandle, PoolReading, TrackedPool};

/// Pool handle with fixed counters.
struct FixedPool(PoolReading);

impl PoolHandle for FixedPool {
    fn read(&self) -> Result<PoolReading, PoolError> {
        Ok(self.0)
    }
}

fn reading(active: u32, size: u32) -> PoolReading {
    PoolReading {
        checked_out: active,
        checked_in: size.saturating_sub(active),
        size,
        overflow: 0,
        max_overflow: 10,
    }
}

#[test]
fn history_of_three_keeps_last_three() {
    let history = History::new(3);
    let before = Utc::now() - chrono::Duration::seconds(1);
    for active in 1..=4 {
        history.append(PoolSample::new(reading(active, 10), Utc::now()));
    }

    let kept: Vec<u32> = history
        .snapshot_since(before)
        .iter()
        .map(PoolSample::active_connections)
        .collect();
    assert_eq!(kept, vec![2, 3, 4]);
}

#[test]
fn nine_of_ten_scores_as_high_warning() {
    let sample = PoolSample::new(reading(9, 10), Utc::now());
    assert_eq!(sample.pool_usage_percent(), 90.0);

    let report = HealthReport::assess(&sample);
    assert_eq!(report.tier, UsageTier::High);
    assert_eq!(report.health_score, 50);
    assert_eq!(report.status, HealthStatus::Warning);
}

#[tokio::test]
async fn zero_window_ignores_retained_samples() {
    let monitor = PoolMonitor::new(Arc::new(FixedPool(reading(2, 10))), 10);
    monitor.run(Duration::from_millis(5)).unwrap();
    tokio::time::sleep(Duration::from_millis(40)).await;
    monitor.stop().await;

    assert!(monitor.history_len() > 0);
    assert!(monitor.history(0).unwrap().is_empty());
    assert_eq!(monitor.history(10).unwrap().len(), monitor.history_len());
}

#[tokio::test]
async fn invalid_window_is_rejected_before_lookup() {
    let monitor = PoolMonitor::new(Arc::new(FixedPool(reading(2, 10))), 10);
    assert_eq!(monitor.history(-3), Err(MonitorError::InvalidWindow(-3)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_run_alongside_the_sampler() {
    const CAP: usize = 8;
    let pool = Arc::new(TrackedPool::new(20, 5));
    let monitor = Arc::new(PoolMonitor::new(pool.clone(), CAP));
    monitor.run(Duration::from_millis(1)).unwrap();

    let churn = {
        let pool = pool.clone();
        tokio::spawn(async move {
            for _ in 0..200 {
                let conns: Vec<_> = (0..5).filter_map(|_| pool.checkout().ok()).collect();
                tokio::task::yield_now().await;
                drop(conns);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let monitor = monitor.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let window = monitor.history(60).unwrap();
                    assert!(window.len() <= CAP);
                    for pair in window.windows(2) {
                        assert!(pair[0].timestamp() <= pair[1].timestamp());
                    }
                    if let Some(s) = monitor.latest() {
                        assert!(s.active_connections() + s.idle_connections() <= 25);
                    }
                    let live = monitor.current_stats().unwrap();
                    assert_eq!(live.pool_size(), 20);
                    tokio::time::sleep(Duration::from_micros(200)).await;
                }
            })
        })
        .collect();

    churn.await.unwrap();
    for r in readers {
        r.await.unwrap();
    }

    monitor.stop().await;
    let frozen = monitor.history(60).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(monitor.history(60).unwrap(), frozen);
    assert!(frozen.len() <= CAP);
}
