//! Input validation for stream definitions.
//!
//! Applied at the API boundary before a definition reaches the registry.
//! The registry itself only enforces uniqueness.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::StreamDefinition;
use crate::error::{StreamError, StreamResult};
use crate::settings::{PortRange, Settings};

/// Maximum length of a stream name or outbound path.
pub const MAX_NAME_LEN: usize = 64;

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid name regex"));

static SOURCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^rtmp://[\w.\-]+(:[0-9]+)?/.*$").expect("valid source regex"));

/// Check that `name` is usable as a registry key and URL path segment.
pub fn validate_name(name: &str) -> StreamResult<()> {
    if name.is_empty() {
        return Err(StreamError::invalid("name must not be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(StreamError::invalid(format!(
            "name '{name}' is longer than {MAX_NAME_LEN} characters"
        )));
    }
    if name == "." || name == ".." || !NAME_RE.is_match(name) {
        return Err(StreamError::invalid(format!(
            "name '{name}' may only contain letters, digits, '_', '-' and '.'"
        )));
    }
    Ok(())
}

/// Check that `source` looks like an RTMP URL.
pub fn validate_source(source: &str) -> StreamResult<()> {
    if SOURCE_RE.is_match(source) {
        Ok(())
    } else {
        Err(StreamError::invalid(format!(
            "source '{source}' is not a valid rtmp:// URL"
        )))
    }
}

/// Check that `port` lies in the allowed range.
pub fn validate_port(port: u16, range: PortRange) -> StreamResult<()> {
    if range.contains(port) {
        Ok(())
    } else {
        Err(StreamError::invalid(format!(
            "port {port} must be between {} and {}",
            range.min, range.max
        )))
    }
}

/// Validate every field of a definition.
pub fn validate_definition(def: &StreamDefinition, settings: &Settings) -> StreamResult<()> {
    validate_name(&def.name)?;
    validate_name(&def.path).map_err(|e| match e {
        StreamError::InvalidInput(msg) => StreamError::InvalidInput(format!("path: {msg}")),
        other => other,
    })?;
    validate_source(&def.source)?;
    validate_port(def.port, settings.port_range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        for name in ["cam1", "front-door", "lobby_2", "v1.0"] {
            assert!(validate_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn test_invalid_names() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        for name in ["", "a/b", "has space", "..", "ünï", long.as_str()] {
            assert!(validate_name(name).is_err(), "{name:?} should be invalid");
        }
    }

    #[test]
    fn test_sources() {
        assert!(validate_source("rtmp://localhost/live/test").is_ok());
        assert!(validate_source("rtmp://10.0.0.5:1935/app/key").is_ok());
        assert!(validate_source("http://localhost/live").is_err());
        assert!(validate_source("rtmp://localhost").is_err());
        assert!(validate_source("rtmp://bad host/live").is_err());
    }

    #[test]
    fn test_port_range() {
        let range = PortRange::default();
        assert!(validate_port(8554, range).is_ok());
        assert!(validate_port(1023, range).is_err());
        assert!(validate_port(1024, range).is_ok());
    }

    #[test]
    fn test_definition_reports_path_errors() {
        let def = StreamDefinition::new("cam", "rtmp://h/live", 8554, "a b");
        let err = validate_definition(&def, &Settings::default()).unwrap_err();
        assert!(err.to_string().contains("path"));
    }
}
