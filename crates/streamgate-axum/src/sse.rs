//! Server-sent events for stream lifecycle changes.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use streamgate_core::StreamEvent;
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_util::sync::CancellationToken;

/// Turn a lifecycle event receiver into an SSE response.
///
/// Each event is sent as JSON with the event kind as the SSE event name.
/// Slow clients that lag behind the channel skip the missed events.
/// The stream ends when `shutdown` is cancelled so graceful server
/// shutdown is not held open by subscribers.
/// Includes a keep-alive ping every 30 seconds to prevent proxy timeouts.
pub fn event_stream(
    receiver: broadcast::Receiver<StreamEvent>,
    shutdown: CancellationToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + Send + 'static> {
    let stream = BroadcastStream::new(receiver).filter_map(|result| match result {
        Ok(event) => match Event::default().event(kind(&event)).json_data(&event) {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                tracing::warn!("Failed to serialize event: {}", e);
                None
            }
        },
        Err(e) => {
            tracing::debug!("SSE stream error: {}", e);
            None
        }
    });
    let stream = futures_util::StreamExt::take_until(stream, shutdown.cancelled_owned());

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

const fn kind(event: &StreamEvent) -> &'static str {
    match event {
        StreamEvent::Started { .. } => "started",
        StreamEvent::Stopped { .. } => "stopped",
        StreamEvent::Exited { .. } => "exited",
        StreamEvent::Restarting { .. } => "restarting",
        StreamEvent::GaveUp { .. } => "gave_up",
    }
}
