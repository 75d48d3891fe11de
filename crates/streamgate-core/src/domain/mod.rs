//! Domain model for supervised streams.

mod metrics;
mod status;
mod stream;

pub use metrics::{ConnectionPhase, MetricValue, Metrics};
pub use status::StatusView;
pub use stream::{OUTBOUND_SCHEME, StreamDefinition};
