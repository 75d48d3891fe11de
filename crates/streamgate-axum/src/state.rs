//! Shared application state type.

use std::sync::Arc;

use streamgate_runtime::StreamService;

/// Application state shared across all handlers.
///
/// The service is constructed once by the composition root and shared
/// by handle; handlers never build their own.
pub type AppState = Arc<StreamService>;
