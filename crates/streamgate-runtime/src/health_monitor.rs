//! Self-healing loop.
//!
//! A single background task that periodically asks the registry to restart
//! streams whose worker died without a stop request. It holds no stream
//! state itself; the restart goes through the same start path as a user
//! request.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::StreamRegistry;

/// Periodic restart of unexpectedly exited streams.
pub struct HealthMonitor {
    registry: Arc<StreamRegistry>,
    interval: Duration,
    cancel_token: CancellationToken,
}

impl HealthMonitor {
    /// Create a new health monitor.
    ///
    /// # Arguments
    ///
    /// * `registry` - Registry to scan
    /// * `check_interval` - Time between scans (e.g., 5 seconds)
    /// * `cancel_token` - Token to signal monitor shutdown
    pub fn new(
        registry: Arc<StreamRegistry>,
        check_interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            registry,
            interval: check_interval,
            cancel_token,
        }
    }

    /// Spawn the monitor loop onto the current runtime.
    pub fn spawn(self) -> HealthMonitorHandle {
        let cancel_token = self.cancel_token.clone();
        let join = tokio::spawn(self.run());
        HealthMonitorHandle { cancel_token, join }
    }

    /// Run until the cancellation token fires.
    ///
    /// Cancellation is checked between scans; a scan in progress finishes
    /// its current restarts first.
    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(interval = ?self.interval, "Starting health monitor");

        loop {
            tokio::select! {
                biased;
                () = self.cancel_token.cancelled() => {
                    debug!("Health monitor cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let restarted = self.registry.recover_exited().await;
                    if restarted > 0 {
                        debug!(restarted, "Health monitor restarted streams");
                    }
                }
            }
        }
    }
}

/// Handle to a running [`HealthMonitor`].
#[derive(Debug)]
pub struct HealthMonitorHandle {
    cancel_token: CancellationToken,
    join: JoinHandle<()>,
}

impl HealthMonitorHandle {
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel the monitor and wait for it to stop.
    ///
    /// If the loop does not finish within `wait`, the task is aborted.
    pub async fn shutdown(self, wait: Duration) {
        self.cancel_token.cancel();

        let mut join = self.join;
        match timeout(wait, &mut join).await {
            Ok(Ok(())) => debug!("Health monitor stopped"),
            Ok(Err(e)) => warn!(error = %e, "Health monitor task failed"),
            Err(_) => {
                warn!("Health monitor stop timed out; aborting task");
                join.abort();
            }
        }
    }
}
