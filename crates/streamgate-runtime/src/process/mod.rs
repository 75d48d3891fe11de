//! Process-level infrastructure for worker supervision.
//!
//! # Structure
//!
//! - `WorkerLauncher` - builds the command for one stream's worker
//! - `spawn_diagnostic_reader` / `DiagnosticSink` - line-oriented stderr reading
//! - `shutdown_child` - graceful stop with forced-kill escalation
//! - `LogBuffer` - recent diagnostic lines per stream
//! - `EventBroadcaster` - lifecycle event fan-out

mod broadcaster;
mod launcher;
mod logs;
mod reader;
mod shutdown;

pub use broadcaster::EventBroadcaster;
pub use launcher::WorkerLauncher;
pub use logs::{DiagnosticLine, LogBuffer};
pub use reader::{DiagnosticSink, spawn_diagnostic_reader};
pub use shutdown::shutdown_child;
