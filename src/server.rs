use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::handlers;
use crate::middleware::timing;
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Pool monitor ────────────────────────────────────────
        .route("/pool/stats", get(handlers::pool::get_stats))
        .route("/pool/history", get(handlers::pool::get_history))
        .route(
            "/pool/history/summary",
            get(handlers::pool::get_summary),
        )
        .route("/pool/health", get(handlers::pool::get_health))
        .route("/pool/stream", get(handlers::stream::pool_stream))
        // ── Synthetic workload control ──────────────────────────
        .route("/demo/load/start", post(handlers::load::start_load))
        .route("/demo/load/stop", post(handlers::load::stop_load))
        .route("/demo/load/status", get(handlers::load::load_status))
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
