//! Metric extraction from ffmpeg diagnostic lines.
//!
//! ffmpeg reports progress in two textual shapes:
//!
//! - `-progress` output: one `key=value` pair per line
//!   (`frame=120`, `out_time=00:00:04.800000`, `speed=1.01x`)
//! - the classic stats line: many pairs on one line, values padded with
//!   spaces (`frame=  120 fps= 25 q=-1.0 size=     512KiB time=00:00:04.80 ...`)
//!
//! Both are handled by a single pair scan, so callers never need to know
//! which shape the worker is currently producing. Connection phase
//! detection runs independently on every line.
//!
//! Parsing is stateless and never fails: unknown keys are ignored and
//! malformed values fall back to per-key defaults.

use std::sync::LazyLock;

use regex::Regex;
use streamgate_core::{ConnectionPhase, MetricValue, Metrics};

/// A key opening a pair: start of line or whitespace, identifier, `=`.
static KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)([A-Za-z_][A-Za-z0-9_]*)=").expect("valid key regex")
});

/// Substrings meaning the worker could not reach its input or output.
const FAILED_MARKERS: &[&str] = &[
    "Connection refused",
    "Connection timed out",
    "Connection reset by peer",
    "No route to host",
    "Input/output error",
    "Error opening input",
    "Error opening output",
    "Failed to resolve hostname",
    "Server returned 4",
    "Server returned 5",
    "Could not write header",
];

/// Substrings meaning input and output streams are wired up.
const CONNECTED_MARKERS: &[&str] = &["Stream mapping:"];

/// Substrings meaning an output is being opened.
const CONNECTING_MARKERS: &[&str] = &["Output #", "for writing"];

/// Metric updates and phase signal extracted from one line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedUpdate {
    /// `(key, value)` pairs in line order.
    pub metrics: Vec<(&'static str, MetricValue)>,
    /// Connection phase implied by the line, if any.
    pub phase: Option<ConnectionPhase>,
}

impl ParsedUpdate {
    /// True when the line carried nothing recognizable.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty() && self.phase.is_none()
    }

    /// Last value reported for `key` on this line.
    pub fn get(&self, key: &str) -> Option<&MetricValue> {
        self.metrics
            .iter()
            .rev()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Fold this update into a stream's accumulated state.
    pub fn apply_to(self, metrics: &mut Metrics, phase: &mut ConnectionPhase) {
        for (key, value) in self.metrics {
            metrics.insert(key.to_string(), value);
        }
        if let Some(next) = self.phase {
            *phase = next;
        }
    }
}

/// Parse one diagnostic line.
pub fn parse_line(line: &str) -> ParsedUpdate {
    let keys: Vec<_> = KEY_RE
        .captures_iter(line)
        .filter_map(|cap| cap.get(1))
        .collect();

    // A value is the first token between its key and the next key, so an
    // empty value never swallows the pair that follows it.
    let metrics = keys
        .iter()
        .enumerate()
        .filter_map(|(i, key)| {
            let end = keys.get(i + 1).map_or(line.len(), |next| next.start());
            let raw = line[key.end() + 1..end]
                .split_whitespace()
                .next()
                .unwrap_or("");
            coerce(key.as_str(), raw)
        })
        .collect();

    ParsedUpdate {
        metrics,
        phase: detect_phase(line),
    }
}

/// Map a raw pair onto a metric key and typed value.
fn coerce(key: &str, raw: &str) -> Option<(&'static str, MetricValue)> {
    let coerced = match key {
        "frame" => ("frame", MetricValue::Integer(parse_int(raw))),
        "fps" => ("fps", MetricValue::Float(parse_float(raw, 0.0))),
        "q" => ("q", MetricValue::Float(parse_float(raw, -1.0))),
        k if is_stream_quality(k) => ("q", MetricValue::Float(parse_float(raw, -1.0))),
        "size" | "Lsize" => ("size", parse_size(raw)),
        // `-progress` reports bytes; normalised to kB like the stats line.
        "total_size" => ("size", parse_total_size(raw)),
        "time" | "out_time" => ("time", parse_clock(raw)),
        "elapsed" => ("elapsed", parse_clock(raw)),
        "speed" => (
            "speed",
            MetricValue::Float(parse_float(raw.trim_end_matches('x'), 0.0)),
        ),
        "drop_frames" | "drop" => ("drop", MetricValue::Integer(parse_int(raw))),
        "dup_frames" | "dup" => ("dup", MetricValue::Integer(parse_int(raw))),
        _ => return None,
    };
    Some(coerced)
}

/// `-progress` names per-stream quality `stream_<file>_<stream>_q`.
fn is_stream_quality(key: &str) -> bool {
    key.strip_prefix("stream_")
        .and_then(|rest| rest.strip_suffix("_q"))
        .is_some_and(|ids| !ids.is_empty() && ids.chars().all(|c| c.is_ascii_digit() || c == '_'))
}

/// Unsigned decimal counter; anything else (including a sign) reads as 0.
fn parse_int(raw: &str) -> i64 {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    raw.parse().unwrap_or(0)
}

fn parse_float(raw: &str, default: f64) -> f64 {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

#[allow(clippy::cast_possible_truncation)]
fn round_div(numerator: u64, denominator: u64) -> i64 {
    (numerator as f64 / denominator as f64).round() as i64
}

fn parse_size(raw: &str) -> MetricValue {
    if raw == MetricValue::UNAVAILABLE {
        return MetricValue::unavailable();
    }

    if let Some(kib) = raw.strip_suffix("KiB") {
        return kib
            .parse::<u64>()
            .map_or_else(|_| MetricValue::unavailable(), |n| {
                MetricValue::Integer(round_div(n.saturating_mul(1024), 1000))
            });
    }

    let digits = raw.strip_suffix("kB").unwrap_or(raw);
    digits
        .parse::<i64>()
        .map_or_else(|_| MetricValue::unavailable(), MetricValue::Integer)
}

fn parse_total_size(raw: &str) -> MetricValue {
    raw.parse::<u64>()
        .map_or_else(|_| MetricValue::unavailable(), |bytes| {
            MetricValue::Integer(round_div(bytes, 1000))
        })
}

/// Normalise `H+:MM:SS[.frac]` to `HH:MM:SS`, dropping the fraction.
fn parse_clock(raw: &str) -> MetricValue {
    let whole = raw.split('.').next().unwrap_or(raw);
    let mut parts = whole.split(':');
    let (Some(h), Some(m), Some(s), None) = (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return MetricValue::unavailable();
    };

    let field = |p: &str| -> Option<u64> {
        if p.is_empty() || !p.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        p.parse().ok()
    };

    match (field(h), field(m), field(s)) {
        (Some(h), Some(m), Some(s)) if m < 60 && s < 60 => {
            MetricValue::Text(format!("{h:02}:{m:02}:{s:02}"))
        }
        _ => MetricValue::unavailable(),
    }
}

fn detect_phase(line: &str) -> Option<ConnectionPhase> {
    let contains_any = |markers: &[&str]| markers.iter().any(|m| line.contains(m));

    if contains_any(FAILED_MARKERS) {
        Some(ConnectionPhase::Failed)
    } else if contains_any(CONNECTED_MARKERS) {
        Some(ConnectionPhase::Connected)
    } else if contains_any(CONNECTING_MARKERS) {
        Some(ConnectionPhase::Connecting)
    } else {
        None
    }
}
