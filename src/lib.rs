//! Database connection-pool diagnostics.
//!
//! A background sampler reads a [`pool::PoolHandle`] on a fixed interval and
//! keeps a bounded rolling history; [`monitor::PoolMonitor`] serves fresh
//! samples, time-windowed history and a health verdict. The axum router in
//! [`server`] exposes all of it as JSON.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod load_generator;
pub mod middleware;
pub mod monitor;
pub mod pool;
pub mod server;

use load_generator::LoadCounters;
use monitor::PoolMonitor;
use pool::TrackedPool;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// The one monitor for this process.
    pub monitor: Arc<PoolMonitor>,

    /// Pool the monitor watches and the synthetic workload borrows from.
    pub pool: Arc<TrackedPool>,

    /// Flag checked by every workload worker on each iteration.
    pub load_running: Arc<AtomicBool>,

    pub load_counters: Arc<LoadCounters>,

    /// Handle to the spawned workload task so we can await clean shutdown.
    pub load_handle: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl AppState {
    pub fn new(monitor: Arc<PoolMonitor>, pool: Arc<TrackedPool>) -> Self {
        Self {
            monitor,
            pool,
            load_running: Arc::new(AtomicBool::new(false)),
            load_counters: Arc::new(LoadCounters::default()),
            load_handle: tokio::sync::Mutex::new(None),
        }
    }
}
