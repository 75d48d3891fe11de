//! Request and response bodies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use streamgate_core::{Settings, StreamDefinition};

/// Body of `POST /api/streams`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddStreamRequest {
    pub name: String,
    #[serde(alias = "source")]
    pub rtmp_input: String,
    /// Falls back to the configured default port.
    #[serde(default, alias = "port")]
    pub rtsp_port: Option<u16>,
    /// Falls back to the stream name.
    #[serde(default)]
    pub path: Option<String>,
    /// Start the stream right after adding it.
    #[serde(default = "default_start")]
    pub start: bool,
}

const fn default_start() -> bool {
    true
}

impl AddStreamRequest {
    pub fn into_definition(self, settings: &Settings) -> StreamDefinition {
        let port = self.rtsp_port.unwrap_or(settings.default_port);
        let path = self.path.unwrap_or_else(|| self.name.clone());
        StreamDefinition::new(self.name, self.rtmp_input, port, path)
    }
}

/// Generic acknowledgement body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outcome of `POST /api/streams/start-all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartAllResponse {
    pub started: Vec<String>,
    /// Stream name to error message.
    pub failed: BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_port_and_path() {
        let req: AddStreamRequest =
            serde_json::from_str(r#"{"name": "cam1", "rtmp_input": "rtmp://h/live/cam1"}"#)
                .unwrap();
        assert!(req.start);

        let def = req.into_definition(&Settings::default());
        assert_eq!(def.port, 8554);
        assert_eq!(def.path, "cam1");
    }

    #[test]
    fn test_aliases_accepted() {
        let req: AddStreamRequest = serde_json::from_str(
            r#"{"name": "cam1", "source": "rtmp://h/live/cam1", "port": 9000, "start": false}"#,
        )
        .unwrap();
        assert_eq!(req.rtsp_port, Some(9000));
        assert!(!req.start);
    }
}
