use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use crate::AppState;

// ─── GET /pool/stream ────────────────────────────────────────────
/// Server-Sent Events endpoint.
/// Pushes a fresh pool sample as JSON every second, or an `unavailable`
/// event carrying the error while the monitor cannot sample.

pub async fn pool_stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let interval = tokio::time::interval(Duration::from_secs(1));

    let stream = IntervalStream::new(interval).map(move |_| {
        let event = match state.monitor.current_stats() {
            Ok(sample) => {
                let json = serde_json::to_string(&sample).unwrap_or_default();
                Event::default().data(json)
            }
            Err(e) => Event::default().event("unavailable").data(e.to_string()),
        };
        Ok(event)
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
