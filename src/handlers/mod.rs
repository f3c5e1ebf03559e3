pub mod load;
pub mod pool;
pub mod stream;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::MonitorError;

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug)]
pub enum AppError {
    Monitor(MonitorError),
    BadRequest(String),
    AlreadyRunning,
}

impl From<MonitorError> for AppError {
    fn from(e: MonitorError) -> Self {
        Self::Monitor(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            // Reporting clients match on this exact body
            Self::Monitor(MonitorError::NotStarted) => {
                let body = serde_json::json!({
                    "error": MonitorError::NotStarted.to_string(),
                });
                return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
            }
            Self::Monitor(e @ MonitorError::InvalidWindow(_))
            | Self::Monitor(e @ MonitorError::InvalidInterval) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            Self::Monitor(e @ MonitorError::Sample(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::AlreadyRunning => {
                (StatusCode::CONFLICT, "Workload already running".into())
            }
        };

        let body = serde_json::json!({
            "error":  message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
