use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use crate::AppState;

use super::AppError;

// ─── Request / response types ────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    /// Number of concurrent Tokio tasks borrowing connections
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,

    /// How long the workload runs (seconds)
    #[serde(default = "default_duration")]
    pub duration_secs: u64,

    /// Average time a connection is held (milliseconds)
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
}

fn default_concurrency() -> u32 {
    12
}
fn default_duration() -> u64 {
    120
}
fn default_hold_ms() -> u64 {
    200
}

#[derive(Debug, Serialize)]
pub struct LoadStatus {
    pub running: bool,
    pub message: String,
    pub checkouts: u64,
    pub exhausted: u64,
}

impl LoadStatus {
    fn new(state: &AppState, running: bool, message: impl Into<String>) -> Self {
        Self {
            running,
            message: message.into(),
            checkouts: state.load_counters.checkouts.load(Ordering::Relaxed),
            exhausted: state.load_counters.exhausted.load(Ordering::Relaxed),
        }
    }
}

// ─── POST /demo/load/start ───────────────────────────────────────

pub async fn start_load(
    State(state): State<Arc<AppState>>,
    Json(config): Json<LoadConfig>,
) -> Result<Json<LoadStatus>, AppError> {
    if config.concurrency == 0 || config.concurrency > 500 {
        return Err(AppError::BadRequest(
            "concurrency must be between 1 and 500".into(),
        ));
    }
    if config.duration_secs == 0 || config.duration_secs > 3600 {
        return Err(AppError::BadRequest(
            "duration_secs must be between 1 and 3600".into(),
        ));
    }
    if config.hold_ms == 0 || config.hold_ms > 10_000 {
        return Err(AppError::BadRequest(
            "hold_ms must be between 1 and 10000".into(),
        ));
    }

    // Held until the handle is stored so `stop` never misses it
    let mut guard = state.load_handle.lock().await;

    // Claim the single workload slot; flipping the flag BEFORE spawning
    // also lets workers see it immediately
    if state
        .load_running
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        return Err(AppError::AlreadyRunning);
    }

    state.load_counters.reset();

    let msg = format!(
        "Started: {} workers × {}s, ~{}ms per checkout",
        config.concurrency, config.duration_secs, config.hold_ms,
    );
    info!(
        concurrency = config.concurrency,
        duration_secs = config.duration_secs,
        hold_ms = config.hold_ms,
        "Synthetic workload started"
    );

    let handle = tokio::spawn(crate::load_generator::run(
        state.load_running.clone(),
        state.load_counters.clone(),
        state.pool.clone(),
        config.concurrency,
        config.duration_secs,
        config.hold_ms,
    ));

    // Stash the handle so `stop` can await clean shutdown
    *guard = Some(handle);
    drop(guard);

    Ok(Json(LoadStatus::new(&state, true, msg)))
}

// ─── POST /demo/load/stop ────────────────────────────────────────

pub async fn stop_load(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    if !state.load_running.load(Ordering::SeqCst) {
        return Json(LoadStatus::new(&state, false, "No workload is running"));
    }

    // Signal all workers to stop
    state.load_running.store(false, Ordering::SeqCst);

    let mut guard = state.load_handle.lock().await;
    if let Some(handle) = guard.take() {
        // Ignore JoinError — the task may have already finished
        let _ = handle.await;
    }

    Json(LoadStatus::new(&state, false, "Workload stopped"))
}

// ─── GET /demo/load/status ───────────────────────────────────────

pub async fn load_status(State(state): State<Arc<AppState>>) -> Json<LoadStatus> {
    let running = state.load_running.load(Ordering::SeqCst);
    let message = if running { "Workload in progress" } else { "Idle" };
    Json(LoadStatus::new(&state, running, message))
}
