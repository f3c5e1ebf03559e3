use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::monitor::sample::{round_to, unix_seconds, usage_percent};
use crate::monitor::{HealthReport, HistorySummary, PoolSample};
use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct WindowParams {
    #[serde(default = "default_minutes")]
    pub minutes: i64,
}

fn default_minutes() -> i64 {
    60
}

/// Malformed query strings get the same JSON error body as every other
/// failure instead of axum's plain-text rejection.
fn window(params: Result<Query<WindowParams>, QueryRejection>) -> Result<i64, AppError> {
    params
        .map(|Query(p)| p.minutes)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

/// One row of `/pool/history`; `usage_percent` is recomputed from the
/// counters at serialization time.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub active_connections: u32,
    pub idle_connections: u32,
    pub total_connections: u32,
    pub overflow: i64,
    #[serde(serialize_with = "unix_seconds")]
    pub timestamp: DateTime<Utc>,
    pub usage_percent: f64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
    pub period_minutes: i64,
    pub total_records: usize,
}

impl From<&PoolSample> for HistoryEntry {
    fn from(s: &PoolSample) -> Self {
        Self {
            active_connections: s.active_connections(),
            idle_connections: s.idle_connections(),
            total_connections: s.total_connections(),
            overflow: s.overflow(),
            timestamp: s.timestamp(),
            usage_percent: round_to(
                usage_percent(s.active_connections(), s.pool_size()),
                1,
            ),
        }
    }
}

// ─── GET /pool/stats ─────────────────────────────────────────────

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PoolSample>, AppError> {
    Ok(Json(state.monitor.current_stats()?))
}

// ─── GET /pool/history?minutes=N ─────────────────────────────────

pub async fn get_history(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<HistoryResponse>, AppError> {
    let minutes = window(params)?;
    let samples = state.monitor.history(minutes)?;
    let history: Vec<HistoryEntry> = samples.iter().map(HistoryEntry::from).collect();

    Ok(Json(HistoryResponse {
        total_records: history.len(),
        period_minutes: minutes,
        history,
    }))
}

// ─── GET /pool/history/summary?minutes=N ─────────────────────────

pub async fn get_summary(
    State(state): State<Arc<AppState>>,
    params: Result<Query<WindowParams>, QueryRejection>,
) -> Result<Json<HistorySummary>, AppError> {
    Ok(Json(state.monitor.summary(window(params)?)?))
}

// ─── GET /pool/health ────────────────────────────────────────────

pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthReport>, AppError> {
    Ok(Json(state.monitor.health()?))
}
