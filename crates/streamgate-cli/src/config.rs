//! Streams and settings files.
//!
//! The streams file is a JSON array of entries. A missing or malformed
//! streams file is logged and treated as empty so the API still comes up;
//! a settings file that was asked for but cannot be read is an error.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use streamgate_core::{Settings, StreamDefinition};
use tracing::{error, info};

/// One entry of the streams file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
    pub name: String,
    pub rtmp_input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rtsp_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StreamEntry {
    /// Definition with the configured default port and the name as path
    /// filled in where the entry omits them.
    pub fn into_definition(self, settings: &Settings) -> StreamDefinition {
        let port = self.rtsp_port.unwrap_or(settings.default_port);
        let path = self.path.unwrap_or_else(|| self.name.clone());
        StreamDefinition::new(self.name, self.rtmp_input, port, path)
    }
}

/// Read the streams file, logging and returning no streams on failure.
pub fn load_streams(path: &Path) -> Vec<StreamEntry> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            error!("Configuration file '{}' could not be read: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str(&contents) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Error decoding JSON from '{}': {}", path.display(), e);
            Vec::new()
        }
    }
}

/// Read runtime settings, or defaults when no file is given.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file {}", path.display()))?;
    let settings: Settings = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse settings file {}", path.display()))?;
    settings
        .validate()
        .with_context(|| format!("Invalid settings in {}", path.display()))?;
    Ok(settings)
}

/// Write a sample streams file.
pub fn write_sample_config(path: &Path) -> Result<()> {
    let sample = vec![StreamEntry {
        name: "test_stream".to_string(),
        rtmp_input: "rtmp://localhost/live/test".to_string(),
        rtsp_port: Some(streamgate_core::settings::DEFAULT_OUTBOUND_PORT),
        path: None,
    }];

    let json = serde_json::to_string_pretty(&sample).context("Failed to serialize sample")?;
    fs::write(path, json)
        .with_context(|| format!("Failed to write sample config to {}", path.display()))?;
    info!("Sample configuration created: {}", path.display());
    Ok(())
}
