//! Worker process lifecycle.
//!
//! The supervisor spawns one worker per active stream, attaches a
//! diagnostic reader before handing the worker back, and tears workers down
//! with graceful-then-forced termination. It keeps no per-stream state of
//! its own: the returned [`WorkerHandle`] is owned by the registry record.

use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use streamgate_core::{StreamDefinition, StreamError, StreamResult};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::process::{DiagnosticSink, WorkerLauncher, shutdown_child, spawn_diagnostic_reader};

/// Ownership of one running worker and its diagnostic reader.
pub struct WorkerHandle {
    name: String,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    child: Child,
    reader: JoinHandle<()>,
}

impl WorkerHandle {
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Non-blocking exit check.
    ///
    /// An error while polling is treated as an exit: the worker can no
    /// longer be observed, so it cannot be trusted to be running.
    pub fn has_exited(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                debug!(stream = %self.name, ?status, "Worker exited");
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(stream = %self.name, error = %e, "Error checking worker");
                true
            }
        }
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("name", &self.name)
            .field("pid", &self.pid)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

/// Spawns and terminates worker processes.
pub struct ProcessSupervisor {
    launcher: Arc<dyn WorkerLauncher>,
    grace: Duration,
}

impl ProcessSupervisor {
    /// Create a supervisor.
    ///
    /// # Arguments
    ///
    /// * `launcher` - Builds each stream's worker command
    /// * `grace` - How long a stopping worker gets before it is killed
    pub fn new(launcher: Arc<dyn WorkerLauncher>, grace: Duration) -> Self {
        Self { launcher, grace }
    }

    /// Launch the worker for `definition` and attach its diagnostic reader.
    ///
    /// Succeeds as soon as the process exists; it does not wait for the
    /// worker to connect. Must be called from within a tokio runtime.
    pub fn spawn(
        &self,
        definition: &StreamDefinition,
        sink: Arc<dyn DiagnosticSink>,
    ) -> StreamResult<WorkerHandle> {
        let name = definition.name.clone();
        info!(stream = %name, command = %self.launcher.describe(definition), "Starting worker");

        let mut cmd = self.launcher.command(definition);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| StreamError::spawn_failure(&name, e))?;

        // Dropping `child` on this error path kills it (kill_on_drop).
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| StreamError::spawn_failure(&name, "diagnostic pipe unavailable"))?;

        let pid = child.id();
        let reader = spawn_diagnostic_reader(stderr, name.clone(), sink);

        info!(stream = %name, pid = ?pid, "Worker started");

        Ok(WorkerHandle {
            name,
            pid,
            started_at: Utc::now(),
            child,
            reader,
        })
    }

    /// Stop a worker and wait for it to be reaped.
    ///
    /// Sends a graceful stop request, escalates to a forced kill after the
    /// grace period, then waits (bounded by the same grace period) for the
    /// diagnostic reader to drain. A worker already reaped by
    /// [`WorkerHandle::has_exited`] gets no drain: its reader is aborted at
    /// once.
    pub async fn terminate(&self, handle: WorkerHandle) -> Option<ExitStatus> {
        let WorkerHandle {
            name,
            pid,
            mut child,
            mut reader,
            ..
        } = handle;

        debug!(stream = %name, pid = ?pid, "Stopping worker");
        let already_reaped = child.id().is_none();

        let status = match shutdown_child(&mut child, self.grace).await {
            Ok(status) => {
                debug!(stream = %name, %status, "Worker reaped");
                Some(status)
            }
            Err(e) => {
                warn!(stream = %name, error = %e, "Failed to stop worker cleanly");
                None
            }
        };

        // The pipe closes with the process; a reader still running after
        // that is held open by a grandchild and is abandoned.
        if already_reaped {
            if !reader.is_finished() {
                debug!(stream = %name, "Worker already reaped; aborting diagnostic reader");
                reader.abort();
            }
        } else if timeout(self.grace, &mut reader).await.is_err() {
            warn!(stream = %name, "Diagnostic reader did not finish; aborting it");
            reader.abort();
        }

        status
    }
}

impl fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("grace", &self.grace)
            .finish_non_exhaustive()
    }
}
