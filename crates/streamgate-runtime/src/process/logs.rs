//! Recent diagnostic lines per stream.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single diagnostic line from a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticLine {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

impl DiagnosticLine {
    /// Create a line stamped with the current time.
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            line: line.into(),
        }
    }
}

/// Ring buffer holding the most recent lines, oldest first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<DiagnosticLine>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Add a line, evicting the oldest when at capacity.
    pub fn push(&mut self, line: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(DiagnosticLine::new(line));
    }

    pub fn get_all(&self) -> Vec<DiagnosticLine> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
