//! Worker command construction seam.

use streamgate_core::StreamDefinition;
use tokio::process::Command;

/// Builds the command line that runs one stream's worker.
///
/// The supervisor owns stdio wiring and process lifetime; implementations
/// only decide program and arguments. Tests swap in shell scripts here.
pub trait WorkerLauncher: Send + Sync {
    /// Command for the given stream, without stdio configuration.
    fn command(&self, definition: &StreamDefinition) -> Command;

    /// Human-readable command line for logging.
    fn describe(&self, definition: &StreamDefinition) -> String {
        format!("worker for '{}'", definition.name)
    }
}
