//! Shared helpers for runtime integration tests.
//!
//! Workers are `sh -c` scripts instead of ffmpeg, so the supervisor and
//! registry run against real child processes.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use streamgate_core::{RestartPolicy, Settings, StatusView, StreamDefinition};
use streamgate_runtime::{StreamService, WorkerLauncher};
use tokio::process::Command;

/// Emits a connection sequence and one progress block, then idles.
pub const HEALTHY_WORKER: &str = "echo 'Output #0, rtsp, to rtsp://0.0.0.0:8554/cam1:' >&2; \
     echo 'Stream mapping:' >&2; \
     printf 'frame=120\\nfps=25.0\\nspeed=1.01x\\n' >&2; \
     exec sleep 30";

/// Exits immediately with a failure status.
pub const CRASHING_WORKER: &str = "echo 'Connection refused' >&2; exit 1";

/// Runs a fixed shell script for every stream and counts spawns.
pub struct ShellLauncher {
    script: String,
    spawns: AtomicUsize,
}

impl ShellLauncher {
    pub fn new(script: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            script: script.into(),
            spawns: AtomicUsize::new(0),
        })
    }

    /// Script that exits on its first run and idles on every later run.
    pub fn crash_once(marker: &std::path::Path) -> Arc<Self> {
        let marker = marker.display();
        Self::new(format!(
            "if [ -e '{marker}' ]; then exec sleep 30; else touch '{marker}'; exit 1; fi"
        ))
    }

    /// Like [`Self::crash_once`], but the crash leaves a background child
    /// holding the diagnostic pipe open, so only the exit status reveals it.
    pub fn crash_once_detached(marker: &std::path::Path) -> Arc<Self> {
        let marker = marker.display();
        Self::new(format!(
            "if [ -e '{marker}' ]; then exec sleep 30; else touch '{marker}'; sleep 3 & exit 1; fi"
        ))
    }

    pub fn spawns(&self) -> usize {
        self.spawns.load(Ordering::SeqCst)
    }
}

impl WorkerLauncher for ShellLauncher {
    fn command(&self, _definition: &StreamDefinition) -> Command {
        self.spawns.fetch_add(1, Ordering::SeqCst);
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(&self.script);
        cmd
    }
}

pub fn test_settings() -> Settings {
    Settings {
        monitor_interval: Duration::from_millis(100),
        shutdown_grace: Duration::from_secs(2),
        ..Settings::default()
    }
}

pub fn service_with(launcher: Arc<ShellLauncher>, restart: RestartPolicy) -> StreamService {
    let settings = Settings {
        restart,
        ..test_settings()
    };
    StreamService::with_launcher(settings, launcher).expect("valid test settings")
}

pub fn service(launcher: Arc<ShellLauncher>) -> StreamService {
    service_with(launcher, RestartPolicy::unlimited())
}

pub fn cam(name: &str, port: u16) -> StreamDefinition {
    StreamDefinition::named(name, format!("rtmp://localhost/live/{name}"), port)
}

/// Poll a stream's status until `done` holds, panicking after 10 seconds.
pub async fn wait_for_status(
    service: &StreamService,
    name: &str,
    done: impl Fn(&StatusView) -> bool,
) -> StatusView {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    loop {
        let status = service.status(name).await.expect("stream registered");
        if done(&status) {
            return status;
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting on '{name}', last status: {status:?}"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Whether a process with this pid still exists.
#[cfg(unix)]
pub fn process_exists(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    kill(Pid::from_raw(raw), None).is_ok()
}
