use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use pool_xray::config::Cli;
use pool_xray::monitor::PoolMonitor;
use pool_xray::pool::TrackedPool;
use pool_xray::{server, AppState};

#[tokio::main]
async fn main() {
    let config = match Cli::parse().into_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(2);
        }
    };
    config.logging.init();

    // ── 1. Pool under observation ────────────────────────────────
    let pool = Arc::new(TrackedPool::new(config.pool_size, config.max_overflow));
    info!(
        pool_size = pool.size(),
        max_overflow = pool.max_overflow(),
        "Tracked pool ready"
    );

    // ── 2. Start the monitor ─────────────────────────────────────
    let monitor = Arc::new(PoolMonitor::new(pool.clone(), config.max_history));
    if let Err(e) = monitor.run(config.interval) {
        error!(error = %e, "Pool monitor did not start");
    }

    // ── 3. Build Axum router ─────────────────────────────────────
    let state = Arc::new(AppState::new(monitor.clone(), pool));
    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = match tokio::net::TcpListener::bind(config.bind).await {
        Ok(l) => l,
        Err(e) => {
            error!(addr = %config.bind, error = %e, "Failed to bind — is the port already in use?");
            std::process::exit(1);
        }
    };

    info!(addr = %config.bind, "Server listening");
    info!("Pool stats     → http://{}/pool/stats", config.bind);
    info!("Pool history   → http://{}/pool/history?minutes=60", config.bind);
    info!("Pool health    → http://{}/pool/health", config.bind);

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    monitor.stop().await;

    if let Err(e) = served {
        error!(error = %e, "Server exited with error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
