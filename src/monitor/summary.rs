use hdrhistogram::Histogram;
use serde::Serialize;

use super::sample::{round_to, PoolSample};

// ─── Configuration ───────────────────────────────────────────────

/// HdrHistogram starts at 0 → 10 M and auto-resizes past that, 3 significant
/// figures. Usage is recorded in hundredths of a percent so two decimals
/// survive; overflow-heavy pools can push it far beyond 100 %.
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 10_000_000;
const HIST_SIGFIG: u8 = 3;
const USAGE_SCALE: f64 = 100.0;

// ─── Public types ────────────────────────────────────────────────

/// A percentile breakdown for one pool metric across a history window.
#[derive(Debug, Clone, Serialize)]
pub struct PercentileSet {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    pub count: u64,
}

/// Distribution of the samples in one history window.
#[derive(Debug, Clone, Serialize)]
pub struct HistorySummary {
    pub period_minutes: i64,
    pub active_connections: PercentileSet,
    pub pool_usage_percent: PercentileSet,
    pub peak_overflow: i64,
    pub total_records: usize,
}

impl PercentileSet {
    /// Extract a percentile set, dividing every value by `scale`.
    /// Returns zeroed values if the histogram is empty.
    fn from_histogram(hist: &Histogram<u64>, scale: f64) -> Self {
        if hist.len() == 0 {
            return Self::empty();
        }

        let at = |p: f64| round_to(hist.value_at_percentile(p) as f64 / scale, 2);
        Self {
            min: round_to(hist.min() as f64 / scale, 2),
            max: round_to(hist.max() as f64 / scale, 2),
            mean: round_to(hist.mean() / scale, 2),
            p50: at(50.0),
            p95: at(95.0),
            p99: at(99.0),
            count: hist.len(),
        }
    }

    /// All-zero placeholder used for empty windows.
    pub fn empty() -> Self {
        Self {
            min: 0.0,
            max: 0.0,
            mean: 0.0,
            p50: 0.0,
            p95: 0.0,
            p99: 0.0,
            count: 0,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

impl HistorySummary {
    pub fn from_samples(period_minutes: i64, samples: &[PoolSample]) -> Self {
        let mut active = new_histogram();
        let mut usage = new_histogram();

        for s in samples {
            active.saturating_record(u64::from(s.active_connections()));
            usage.saturating_record((s.pool_usage_percent() * USAGE_SCALE).round() as u64);
        }

        Self {
            period_minutes,
            active_connections: PercentileSet::from_histogram(&active, 1.0),
            pool_usage_percent: PercentileSet::from_histogram(&usage, USAGE_SCALE),
            peak_overflow: samples.iter().map(PoolSample::overflow).max().unwrap_or(0),
            total_records: samples.len(),
        }
    }
}

fn new_histogram() -> Histogram<u64> {
    // Bounds are constants, creation cannot fail
    let mut hist = Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
        .expect("histogram creation");
    hist.auto(true);
    hist
}
