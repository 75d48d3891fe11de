//! Lifecycle event fan-out.

use streamgate_core::StreamEvent;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel capacity for stream events
const CHANNEL_CAPACITY: usize = 64;

/// Broadcaster for stream lifecycle events.
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct EventBroadcaster {
    sender: broadcast::Sender<StreamEvent>,
}

impl EventBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Send an event to all current subscribers.
    pub fn broadcast(&self, event: StreamEvent) {
        // Only log if there are receivers
        if self.sender.receiver_count() > 0 {
            debug!(?event, "Broadcasting stream event");
            let _ = self.sender.send(event);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}
