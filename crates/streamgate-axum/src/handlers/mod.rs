//! HTTP request handlers.

pub mod events;
pub mod streams;

/// Liveness probe.
pub async fn health_check() -> &'static str {
    "OK"
}
