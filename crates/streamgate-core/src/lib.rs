//! Core domain for streamgate.
//!
//! This crate holds the pure types shared by the runtime engine and its
//! adapters: stream definitions, metric values, status snapshots, lifecycle
//! events, settings, and input validation. It has no process or I/O
//! dependencies.

pub mod domain;
pub mod error;
pub mod events;
pub mod settings;
pub mod validation;

pub use domain::{
    ConnectionPhase, MetricValue, Metrics, StatusView, StreamDefinition, OUTBOUND_SCHEME,
};
pub use error::{StreamError, StreamResult};
pub use events::StreamEvent;
pub use settings::{BackoffPolicy, PortRange, RestartPolicy, Settings};
pub use validation::{validate_definition, validate_name, validate_port, validate_source};
