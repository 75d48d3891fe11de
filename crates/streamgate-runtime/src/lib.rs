//! Stream supervision engine.
//!
//! Runs one external worker process per active stream, extracts metrics
//! from each worker's diagnostic output, and restarts workers that die
//! without a stop request.
//!
//! The entry point for adapters is [`StreamService`]; the lower layers are
//! public for tests and alternative compositions.

#![deny(unsafe_code)]

pub mod ffmpeg;
pub mod health_monitor;
pub mod process;
pub mod registry;
pub mod service;
pub mod supervisor;

pub use ffmpeg::{FfmpegCommandBuilder, FfmpegLauncher, ParsedUpdate, parse_line};
pub use health_monitor::{HealthMonitor, HealthMonitorHandle};
pub use process::{DiagnosticLine, DiagnosticSink, EventBroadcaster, LogBuffer, WorkerLauncher};
pub use registry::StreamRegistry;
pub use service::StreamService;
pub use supervisor::{ProcessSupervisor, WorkerHandle};
