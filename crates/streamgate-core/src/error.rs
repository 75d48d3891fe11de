//! Error types for stream management.

use thiserror::Error;

/// Errors returned by registry and service operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// A stream with this name is already registered.
    #[error("Stream '{0}' already exists")]
    DuplicateName(String),

    /// Another stream already publishes to this outbound endpoint.
    #[error("Outbound endpoint :{port}/{path} is already used by stream '{owner}'")]
    DuplicatePort {
        port: u16,
        path: String,
        owner: String,
    },

    /// No stream with this name is registered.
    #[error("Stream '{0}' not found")]
    NotFound(String),

    /// The worker process could not be launched.
    #[error("Failed to launch worker for stream '{name}': {reason}")]
    SpawnFailure { name: String, reason: String },

    /// Caller-supplied input was rejected before reaching the registry.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StreamError {
    /// Create a `SpawnFailure` from any displayable cause.
    pub fn spawn_failure(name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::SpawnFailure {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Result type alias for stream operations.
pub type StreamResult<T> = Result<T, StreamError>;
