//! Stream definitions.

use serde::{Deserialize, Serialize};

/// URL scheme of the outbound endpoint every worker publishes to.
pub const OUTBOUND_SCHEME: &str = "rtsp";

/// Immutable description of one inbound → outbound conversion.
///
/// `name` is the registry key. `(port, path)` identifies the outbound
/// endpoint and must not be shared between two streams.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamDefinition {
    /// Unique stream name.
    pub name: String,
    /// Inbound source locator (e.g. `rtmp://host/app/key`).
    pub source: String,
    /// Outbound port.
    pub port: u16,
    /// Outbound path segment, without a leading slash.
    pub path: String,
}

impl StreamDefinition {
    /// Create a definition with an explicit outbound path.
    pub fn new(
        name: impl Into<String>,
        source: impl Into<String>,
        port: u16,
        path: impl Into<String>,
    ) -> Self {
        let path: String = path.into();
        Self {
            name: name.into(),
            source: source.into(),
            port,
            path: path.trim_start_matches('/').to_string(),
        }
    }

    /// Create a definition whose outbound path is the stream name.
    pub fn named(name: impl Into<String>, source: impl Into<String>, port: u16) -> Self {
        let name: String = name.into();
        let path = name.clone();
        Self::new(name, source, port, path)
    }

    /// Whether `other` claims the same outbound endpoint as `self`.
    pub fn same_endpoint(&self, other: &Self) -> bool {
        self.port == other.port && self.path == other.path
    }

    /// Outbound URL as advertised to clients.
    pub fn outbound_url(&self, host: &str) -> String {
        format!("{OUTBOUND_SCHEME}://{host}:{}/{}", self.port, self.path)
    }
}
