//! Runtime settings.
//!
//! Every field has a default so a partial JSON document (or none at all)
//! yields a usable configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{StreamError, StreamResult};

/// Default outbound port when a stream does not specify one.
pub const DEFAULT_OUTBOUND_PORT: u16 = 8554;

/// Default interval between health monitor scans.
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(5);

/// Default grace period between a graceful stop request and a forced kill.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Default number of diagnostic lines kept per stream.
pub const DEFAULT_LOG_CAPACITY: usize = 200;

/// Runtime settings for the stream supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Worker executable (resolved through `PATH` when not absolute).
    pub worker_path: PathBuf,
    /// Host advertised in outbound URLs.
    pub public_host: String,
    /// Host the worker listens on for its outbound endpoint.
    pub bind_host: String,
    /// Ports a stream may claim.
    pub port_range: PortRange,
    /// Port used when a stream entry omits one.
    pub default_port: u16,
    /// Interval between health monitor scans.
    #[serde(with = "duration_ms")]
    pub monitor_interval: Duration,
    /// Grace period before a stopping worker is killed.
    #[serde(with = "duration_ms")]
    pub shutdown_grace: Duration,
    /// Diagnostic lines kept per stream.
    pub log_capacity: usize,
    /// Restart policy applied by the health monitor.
    pub restart: RestartPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worker_path: PathBuf::from("ffmpeg"),
            public_host: "localhost".to_string(),
            bind_host: "0.0.0.0".to_string(),
            port_range: PortRange::default(),
            default_port: DEFAULT_OUTBOUND_PORT,
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            log_capacity: DEFAULT_LOG_CAPACITY,
            restart: RestartPolicy::default(),
        }
    }
}

impl Settings {
    /// Reject settings the runtime cannot operate with.
    pub fn validate(&self) -> StreamResult<()> {
        if self.port_range.min > self.port_range.max {
            return Err(StreamError::invalid(format!(
                "port range {}-{} is empty",
                self.port_range.min, self.port_range.max
            )));
        }
        if !self.port_range.contains(self.default_port) {
            return Err(StreamError::invalid(format!(
                "default port {} is outside {}-{}",
                self.default_port, self.port_range.min, self.port_range.max
            )));
        }
        if self.monitor_interval.is_zero() {
            return Err(StreamError::invalid("monitor interval must be non-zero"));
        }
        if self.worker_path.as_os_str().is_empty() {
            return Err(StreamError::invalid("worker path must not be empty"));
        }
        Ok(())
    }
}

/// Inclusive range of outbound ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            min: 1024,
            max: 65535,
        }
    }
}

impl PortRange {
    pub const fn contains(&self, port: u16) -> bool {
        port >= self.min && port <= self.max
    }
}

/// How the health monitor reacts to a worker that died unexpectedly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestartPolicy {
    /// Restarts allowed between explicit stops (`None` = retry forever).
    pub max_attempts: Option<u32>,
    /// Delay before each attempt, measured from the detected exit.
    pub backoff: BackoffPolicy,
}

impl RestartPolicy {
    /// Restart forever, as soon as the monitor notices the exit.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Give up after `attempts` restarts.
    pub fn capped(attempts: u32) -> Self {
        Self {
            max_attempts: Some(attempts),
            backoff: BackoffPolicy::default(),
        }
    }

    #[must_use]
    pub const fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Whether another attempt is allowed after `attempts` restarts.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

/// Delay growth between restart attempts.
///
/// The delay for attempt `n` (0-indexed) is `first × factor^n`, clamped
/// to `max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    #[serde(with = "duration_ms")]
    pub first: Duration,
    #[serde(with = "duration_ms")]
    pub max: Duration,
    pub factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::from_secs(60),
            factor: 1.0,
        }
    }
}

impl BackoffPolicy {
    /// Delay before attempt `attempt`.
    pub fn next(&self, attempt: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        if !secs.is_finite() || secs < 0.0 || secs > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

/// Serialize a `Duration` as integer milliseconds.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.default_port, 8554);
        assert_eq!(settings.monitor_interval, Duration::from_secs(5));
        assert_eq!(settings.restart.max_attempts, None);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"public_host": "media.local", "monitor_interval": 250}"#)
                .unwrap();
        assert_eq!(settings.public_host, "media.local");
        assert_eq!(settings.monitor_interval, Duration::from_millis(250));
        assert_eq!(settings.shutdown_grace, DEFAULT_SHUTDOWN_GRACE);
        assert_eq!(settings.worker_path, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_validate_rejects_empty_range() {
        let settings = Settings {
            port_range: PortRange {
                min: 9000,
                max: 8000,
            },
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(StreamError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let settings = Settings {
            monitor_interval: Duration::ZERO,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_restart_policy_cap() {
        let policy = RestartPolicy::capped(2);
        assert!(policy.allows(0));
        assert!(policy.allows(1));
        assert!(!policy.allows(2));
        assert!(RestartPolicy::unlimited().allows(u32::MAX));
    }

    #[test]
    fn test_backoff_default_is_immediate() {
        let backoff = BackoffPolicy::default();
        for attempt in 0..5 {
            assert_eq!(backoff.next(attempt), Duration::ZERO);
        }
    }

    #[test]
    fn test_backoff_exponential_growth_clamped() {
        let backoff = BackoffPolicy {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
        };
        assert_eq!(backoff.next(0), Duration::from_millis(100));
        assert_eq!(backoff.next(1), Duration::from_millis(200));
        assert_eq!(backoff.next(3), Duration::from_millis(800));
        assert_eq!(backoff.next(4), Duration::from_secs(1));
        assert_eq!(backoff.next(u32::MAX), Duration::from_secs(1));
    }
}
