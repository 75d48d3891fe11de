//! SSE events handler - real-time lifecycle streaming.

use std::convert::Infallible;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use futures_util::stream::Stream;

use crate::sse::event_stream;
use crate::state::AppState;

/// SSE events stream endpoint.
///
/// Clients receive `started`, `stopped`, `exited`, `restarting` and
/// `gave_up` events for every stream until the service shuts down.
pub async fn stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    event_stream(state.subscribe(), state.cancel_token())
}
