//! Read-only status snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConnectionPhase, Metrics};

/// Consistent snapshot of one stream's definition and runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub name: String,
    /// Inbound source locator.
    #[serde(rename = "rtmp_input")]
    pub source: String,
    /// Outbound URL (`rtsp://<host>:<port>/<path>`).
    #[serde(rename = "rtsp_url")]
    pub url: String,
    pub active: bool,
    pub metrics: Metrics,
    pub connection_phase: ConnectionPhase,
    pub restart_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_view_field_names() {
        let view = StatusView {
            name: "cam1".into(),
            source: "rtmp://localhost/live/cam1".into(),
            url: "rtsp://localhost:8554/cam1".into(),
            active: false,
            metrics: Metrics::new(),
            connection_phase: ConnectionPhase::Unknown,
            restart_count: 0,
            pid: None,
            started_at: None,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["rtmp_input"], "rtmp://localhost/live/cam1");
        assert_eq!(json["rtsp_url"], "rtsp://localhost:8554/cam1");
        assert_eq!(json["active"], false);
        assert!(json.get("pid").is_none());
    }
}
