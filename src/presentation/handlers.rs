// HTTP request handlers
use std::convert::Infallible;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::domain::dashboard::DashboardSnapshot;
use crate::presentation::app_state::AppState;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current dashboard snapshot
pub async fn get_dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    let snapshot = state.dashboard.read().await.snapshot();
    Json(snapshot)
}

/// Pushes one SSE event per dashboard update.
pub async fn stream_dashboard(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut updates = state.updates.subscribe();
    let stream = async_stream::stream! {
        loop {
            match updates.recv().await {
                Ok(snapshot) => match Event::default().json_data(&snapshot) {
                    Ok(event) => yield Ok(event),
                    Err(e) => warn!("failed to serialize snapshot event: {e}"),
                },
                // A slow client just misses the updates it lagged behind on.
                Err(RecvError::Lagged(skipped)) => {
                    warn!("sse subscriber lagged, skipped {skipped} updates");
                }
                Err(RecvError::Closed) => break,
            }
        }
    };
    Sse::new(stream).keep_alive(KeepAlive::default())
}
