//! Stream lifecycle events.
//!
//! Emitted by the runtime whenever a stream changes lifecycle state, so
//! adapters (SSE, logs, tests) can follow transitions without polling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stream lifecycle event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A worker was spawned for the stream.
    Started {
        name: String,
        pid: Option<u32>,
        at: DateTime<Utc>,
    },
    /// The stream was stopped by request.
    Stopped { name: String, at: DateTime<Utc> },
    /// The worker exited without a stop request.
    Exited { name: String, at: DateTime<Utc> },
    /// The health monitor is restarting the stream.
    Restarting {
        name: String,
        attempt: u32,
        at: DateTime<Utc>,
    },
    /// The restart policy is exhausted; the stream stays inactive.
    GaveUp {
        name: String,
        attempts: u32,
        at: DateTime<Utc>,
    },
}

impl StreamEvent {
    pub fn started(name: impl Into<String>, pid: Option<u32>) -> Self {
        Self::Started {
            name: name.into(),
            pid,
            at: Utc::now(),
        }
    }

    pub fn stopped(name: impl Into<String>) -> Self {
        Self::Stopped {
            name: name.into(),
            at: Utc::now(),
        }
    }

    pub fn exited(name: impl Into<String>) -> Self {
        Self::Exited {
            name: name.into(),
            at: Utc::now(),
        }
    }

    pub fn restarting(name: impl Into<String>, attempt: u32) -> Self {
        Self::Restarting {
            name: name.into(),
            attempt,
            at: Utc::now(),
        }
    }

    pub fn gave_up(name: impl Into<String>, attempts: u32) -> Self {
        Self::GaveUp {
            name: name.into(),
            attempts,
            at: Utc::now(),
        }
    }

    /// Name of the stream this event belongs to.
    pub fn name(&self) -> &str {
        match self {
            Self::Started { name, .. }
            | Self::Stopped { name, .. }
            | Self::Exited { name, .. }
            | Self::Restarting { name, .. }
            | Self::GaveUp { name, .. } => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = StreamEvent::started("cam1", Some(4242));
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"started\""));
        assert!(json.contains("\"name\":\"cam1\""));
        assert!(json.contains("\"pid\":4242"));
    }

    #[test]
    fn test_gave_up_uses_snake_case_tag() {
        let json = serde_json::to_string(&StreamEvent::gave_up("cam1", 3)).unwrap();
        assert!(json.contains("\"type\":\"gave_up\""));
        assert!(json.contains("\"attempts\":3"));
    }

    #[test]
    fn test_name_accessor() {
        assert_eq!(StreamEvent::exited("lobby").name(), "lobby");
        assert_eq!(StreamEvent::restarting("lobby", 1).name(), "lobby");
    }
}
