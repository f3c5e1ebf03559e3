use serde::Serialize;

use super::sample::PoolSample;

// ─── Thresholds ──────────────────────────────────────────────────

/// Usage above this is critical.
pub const CRITICAL_USAGE_PERCENT: f64 = 90.0;
/// Usage above this is high.
pub const HIGH_USAGE_PERCENT: f64 = 80.0;
/// Usage above this triggers a sizing recommendation.
pub const RESIZE_USAGE_PERCENT: f64 = 85.0;

const FULL_SCORE: i32 = 100;
const CRITICAL_PENALTY: i32 = 80;
const HIGH_PENALTY: i32 = 50;

// ─── Public types ────────────────────────────────────────────────

/// Usage band a sample falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageTier {
    Nominal,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

/// Health verdict for one pool sample. Pure function of the sample; build a
/// fresh one for every request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub health_score: u8,
    pub status: HealthStatus,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip)]
    pub tier: UsageTier,
}

impl UsageTier {
    pub fn classify(usage_percent: f64) -> Self {
        if usage_percent > CRITICAL_USAGE_PERCENT {
            Self::Critical
        } else if usage_percent > HIGH_USAGE_PERCENT {
            Self::High
        } else {
            Self::Nominal
        }
    }

    fn penalty(self) -> i32 {
        match self {
            Self::Nominal => 0,
            Self::High => HIGH_PENALTY,
            Self::Critical => CRITICAL_PENALTY,
        }
    }

    fn warning(self) -> Option<&'static str> {
        match self {
            Self::Nominal => None,
            Self::High => Some("High pool usage"),
            Self::Critical => Some("Critical pool usage"),
        }
    }
}

impl HealthStatus {
    pub fn from_score(score: u8) -> Self {
        if score > 80 {
            Self::Healthy
        } else if score >= 50 {
            Self::Warning
        } else {
            Self::Critical
        }
    }
}

impl HealthReport {
    pub fn assess(sample: &PoolSample) -> Self {
        let usage = sample.pool_usage_percent();
        let tier = UsageTier::classify(usage);

        let score = (FULL_SCORE - tier.penalty()).clamp(0, FULL_SCORE) as u8;

        let warnings = tier.warning().map(String::from).into_iter().collect();

        let mut recommendations = Vec::new();
        if usage > RESIZE_USAGE_PERCENT {
            recommendations.push("Consider increasing pool size".to_string());
        }

        Self {
            health_score: score,
            status: HealthStatus::from_score(score),
            warnings,
            recommendations,
            tier,
        }
    }
}
