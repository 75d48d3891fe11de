//! Management API over the registry.
//!
//! `StreamService` is constructed once at startup and shared by handle with
//! every adapter. It validates caller input, owns the health monitor, and
//! performs ordered teardown.

use std::collections::BTreeMap;
use std::sync::Arc;

use streamgate_core::{
    Settings, StatusView, StreamDefinition, StreamError, StreamEvent, StreamResult,
    validate_definition,
};
use tokio::sync::{Mutex, broadcast};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::ffmpeg::FfmpegLauncher;
use crate::health_monitor::{HealthMonitor, HealthMonitorHandle};
use crate::process::{DiagnosticLine, WorkerLauncher};
use crate::registry::StreamRegistry;
use crate::supervisor::ProcessSupervisor;

pub struct StreamService {
    registry: Arc<StreamRegistry>,
    settings: Settings,
    monitor: Mutex<Option<HealthMonitorHandle>>,
    cancel_token: CancellationToken,
}

impl StreamService {
    /// Service running ffmpeg workers as configured in `settings`.
    pub fn new(settings: Settings) -> StreamResult<Self> {
        let launcher = Arc::new(FfmpegLauncher::new(
            settings.worker_path.clone(),
            settings.bind_host.clone(),
        ));
        Self::with_launcher(settings, launcher)
    }

    /// Service with a custom worker launcher.
    pub fn with_launcher(
        settings: Settings,
        launcher: Arc<dyn WorkerLauncher>,
    ) -> StreamResult<Self> {
        settings.validate()?;

        let supervisor = ProcessSupervisor::new(launcher, settings.shutdown_grace);
        let registry = Arc::new(StreamRegistry::new(supervisor, &settings));

        Ok(Self {
            registry,
            settings,
            monitor: Mutex::new(None),
            cancel_token: CancellationToken::new(),
        })
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn registry(&self) -> &Arc<StreamRegistry> {
        &self.registry
    }

    /// Token cancelled when the service shuts down.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Spawn the health monitor if it is not already running.
    pub async fn start_monitoring(&self) {
        let mut monitor = self.monitor.lock().await;
        if monitor.as_ref().is_some_and(|m| !m.is_finished()) {
            return;
        }
        *monitor = Some(
            HealthMonitor::new(
                Arc::clone(&self.registry),
                self.settings.monitor_interval,
                self.cancel_token.child_token(),
            )
            .spawn(),
        );
    }

    /// Validate and register a stream. It starts inactive.
    pub async fn add(
        &self,
        name: &str,
        source: &str,
        port: u16,
        path: &str,
    ) -> StreamResult<StatusView> {
        self.add_definition(StreamDefinition::new(name, source, port, path))
            .await
    }

    pub async fn add_definition(&self, definition: StreamDefinition) -> StreamResult<StatusView> {
        validate_definition(&definition, &self.settings)?;
        let name = definition.name.clone();
        self.registry.add(definition).await?;
        self.status(&name).await
    }

    /// Register and start a stream; the stream is removed again if it
    /// cannot be started.
    pub async fn add_and_start(&self, definition: StreamDefinition) -> StreamResult<StatusView> {
        let name = definition.name.clone();
        self.add_definition(definition).await?;

        if let Err(e) = self.registry.start(&name).await {
            warn!(stream = %name, error = %e, "Start failed; removing stream");
            if let Err(remove_err) = self.registry.remove(&name).await {
                warn!(stream = %name, error = %remove_err, "Cleanup after failed start failed");
            }
            return Err(e);
        }
        self.status(&name).await
    }

    pub async fn remove(&self, name: &str) -> StreamResult<()> {
        self.registry.remove(name).await
    }

    pub async fn start(&self, name: &str) -> StreamResult<()> {
        self.registry.start(name).await
    }

    pub async fn stop(&self, name: &str) -> StreamResult<()> {
        self.registry.stop(name).await
    }

    pub async fn toggle(&self, name: &str) -> StreamResult<StatusView> {
        self.registry.toggle(name).await
    }

    pub async fn status(&self, name: &str) -> StreamResult<StatusView> {
        self.registry
            .status(name)
            .await
            .ok_or_else(|| StreamError::NotFound(name.to_string()))
    }

    pub async fn status_all(&self) -> BTreeMap<String, StatusView> {
        self.registry.status_all().await
    }

    pub async fn logs(&self, name: &str) -> StreamResult<Vec<DiagnosticLine>> {
        self.registry.logs(name).await
    }

    pub async fn start_all(&self) -> Vec<(String, StreamResult<()>)> {
        self.registry.start_all().await
    }

    pub async fn stop_all(&self) {
        self.registry.stop_all().await;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.registry.subscribe()
    }

    /// Stop the health monitor, then every stream.
    ///
    /// Returns after every worker has exited.
    pub async fn shutdown(&self) {
        info!("Shutting down stream service");
        self.cancel_token.cancel();

        // A scan in progress may be stopping a worker and waiting on its reader.
        let monitor_wait = self.settings.shutdown_grace * 3;
        if let Some(monitor) = self.monitor.lock().await.take() {
            monitor.shutdown(monitor_wait).await;
        }

        self.registry.stop_all().await;
        info!("All streams stopped");
    }
}

impl std::fmt::Debug for StreamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamService")
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
