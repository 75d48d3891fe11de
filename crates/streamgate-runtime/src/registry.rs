//! Stream registry.
//!
//! Maps stream names to records holding the immutable definition and the
//! mutable runtime state. Every mutating operation on one stream runs under
//! that stream's operation lock, so start/stop/remove/restart never
//! interleave for the same name while distinct streams proceed in parallel.
//!
//! Locking rules:
//! - the map lock is held only for lookups and inserts, never while waiting
//!   on a record;
//! - per record, the operation lock is taken before the state lock;
//! - the state lock is never held across a process wait, so status reads
//!   and diagnostic updates stay responsive during a stop.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use streamgate_core::{
    ConnectionPhase, Metrics, RestartPolicy, Settings, StatusView, StreamDefinition, StreamError,
    StreamEvent, StreamResult,
};
use tokio::sync::{Mutex, RwLock, broadcast};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::ffmpeg::parse_line;
use crate::process::{DiagnosticLine, DiagnosticSink, EventBroadcaster, LogBuffer};
use crate::supervisor::{ProcessSupervisor, WorkerHandle};

/// Mutable runtime state of one stream.
struct StreamState {
    active: bool,
    /// Present exactly while `active`.
    worker: Option<WorkerHandle>,
    restart_count: u32,
    metrics: Metrics,
    phase: ConnectionPhase,
    /// Bumped on every start, stop and detected exit. Diagnostic updates
    /// from a worker of an older generation are ignored.
    generation: u64,
    /// Set when the worker died without a stop request; cleared by a
    /// successful start, an explicit stop, or giving up.
    exited_at: Option<Instant>,
    logs: LogBuffer,
    removed: bool,
}

impl StreamState {
    fn new(log_capacity: usize) -> Self {
        Self {
            active: false,
            worker: None,
            restart_count: 0,
            metrics: Metrics::new(),
            phase: ConnectionPhase::Unknown,
            generation: 0,
            exited_at: None,
            logs: LogBuffer::new(log_capacity),
            removed: false,
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.generation += 1;
        self.metrics.clear();
        self.phase = ConnectionPhase::Unknown;
    }

    fn mark_exited(&mut self) {
        self.deactivate();
        self.exited_at = Some(Instant::now());
    }
}

struct StreamSlot {
    definition: StreamDefinition,
    op: Mutex<()>,
    state: Mutex<StreamState>,
}

impl StreamSlot {
    async fn ensure_present(&self) -> StreamResult<()> {
        if self.state.lock().await.removed {
            return Err(StreamError::NotFound(self.definition.name.clone()));
        }
        Ok(())
    }
}

/// Feeds one worker generation's diagnostic output into its record.
struct RecordSink {
    slot: Arc<StreamSlot>,
    generation: u64,
    events: EventBroadcaster,
    supervisor: Arc<ProcessSupervisor>,
}

#[async_trait]
impl DiagnosticSink for RecordSink {
    async fn line(&self, line: String) {
        let update = parse_line(&line);
        let mut state = self.slot.state.lock().await;
        if state.removed {
            return;
        }

        let current = state.generation == self.generation && state.active;
        state.logs.push(line);

        if current && !update.is_empty() {
            let StreamState { metrics, phase, .. } = &mut *state;
            update.apply_to(metrics, phase);
        }
    }

    async fn closed(&self) {
        let name = &self.slot.definition.name;
        let worker = {
            let mut state = self.slot.state.lock().await;
            if state.generation != self.generation || !state.active {
                return;
            }
            state.mark_exited();
            state.worker.take()
        };

        warn!(stream = %name, "Worker output closed without a stop request");
        self.events.broadcast(StreamEvent::exited(name));

        // Reaping joins this reader, so it runs on its own task.
        if let Some(worker) = worker {
            let supervisor = Arc::clone(&self.supervisor);
            tokio::spawn(async move {
                supervisor.terminate(worker).await;
            });
        }
    }
}

/// Concurrency-safe registry of streams and their workers.
pub struct StreamRegistry {
    streams: RwLock<HashMap<String, Arc<StreamSlot>>>,
    supervisor: Arc<ProcessSupervisor>,
    public_host: String,
    log_capacity: usize,
    restart: RestartPolicy,
    events: EventBroadcaster,
}

impl StreamRegistry {
    pub fn new(supervisor: ProcessSupervisor, settings: &Settings) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            supervisor: Arc::new(supervisor),
            public_host: settings.public_host.clone(),
            log_capacity: settings.log_capacity,
            restart: settings.restart,
            events: EventBroadcaster::new(),
        }
    }

    /// Register a stream in the inactive state.
    pub async fn add(&self, definition: StreamDefinition) -> StreamResult<()> {
        let mut streams = self.streams.write().await;

        if streams.contains_key(&definition.name) {
            return Err(StreamError::DuplicateName(definition.name));
        }
        if let Some(owner) = streams
            .values()
            .find(|slot| slot.definition.same_endpoint(&definition))
        {
            return Err(StreamError::DuplicatePort {
                port: definition.port,
                path: definition.path,
                owner: owner.definition.name.clone(),
            });
        }

        info!(
            stream = %definition.name,
            port = definition.port,
            path = %definition.path,
            "Stream added"
        );

        let slot = Arc::new(StreamSlot {
            state: Mutex::new(StreamState::new(self.log_capacity)),
            op: Mutex::new(()),
            definition,
        });
        streams.insert(slot.definition.name.clone(), slot);
        Ok(())
    }

    /// Stop the stream (if running) and delete it.
    pub async fn remove(&self, name: &str) -> StreamResult<()> {
        let slot = self.slot(name).await?;
        let _op = slot.op.lock().await;
        slot.ensure_present().await?;

        self.stop_locked(&slot).await;
        slot.state.lock().await.removed = true;

        let mut streams = self.streams.write().await;
        if streams.get(name).is_some_and(|s| Arc::ptr_eq(s, &slot)) {
            streams.remove(name);
        }
        info!(stream = %name, "Stream removed");
        Ok(())
    }

    /// Start the stream's worker. Succeeds without effect if already active.
    pub async fn start(&self, name: &str) -> StreamResult<()> {
        let slot = self.slot(name).await?;
        let _op = slot.op.lock().await;
        self.start_locked(&slot).await
    }

    /// Stop the stream's worker. Succeeds without effect if already inactive.
    pub async fn stop(&self, name: &str) -> StreamResult<()> {
        let slot = self.slot(name).await?;
        let _op = slot.op.lock().await;
        slot.ensure_present().await?;
        self.stop_locked(&slot).await;
        Ok(())
    }

    /// Start when inactive, stop when active. Returns the resulting status.
    pub async fn toggle(&self, name: &str) -> StreamResult<StatusView> {
        let slot = self.slot(name).await?;
        let _op = slot.op.lock().await;
        slot.ensure_present().await?;

        let active = slot.state.lock().await.active;
        if active {
            self.stop_locked(&slot).await;
        } else {
            self.start_locked(&slot).await?;
        }
        Ok(self.view(&slot).await)
    }

    pub async fn status(&self, name: &str) -> Option<StatusView> {
        let slot = self.slot(name).await.ok()?;
        Some(self.view(&slot).await)
    }

    pub async fn status_all(&self) -> BTreeMap<String, StatusView> {
        let mut all = BTreeMap::new();
        for slot in self.slots().await {
            all.insert(slot.definition.name.clone(), self.view(&slot).await);
        }
        all
    }

    /// Recent diagnostic lines of one stream, oldest first.
    pub async fn logs(&self, name: &str) -> StreamResult<Vec<DiagnosticLine>> {
        let slot = self.slot(name).await?;
        let state = slot.state.lock().await;
        Ok(state.logs.get_all())
    }

    /// Registered stream names, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.streams.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Start every stream concurrently, returning each outcome by name.
    pub async fn start_all(&self) -> Vec<(String, StreamResult<()>)> {
        let names = self.names().await;
        let results = join_all(names.iter().map(|name| self.start(name))).await;
        names.into_iter().zip(results).collect()
    }

    /// Stop every stream concurrently and wait for every worker to exit.
    pub async fn stop_all(&self) {
        let names = self.names().await;
        for (name, result) in names
            .iter()
            .zip(join_all(names.iter().map(|name| self.stop(name))).await)
        {
            if let Err(e) = result {
                debug!(stream = %name, error = %e, "Stream vanished during stop_all");
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StreamEvent> {
        self.events.subscribe()
    }

    /// Restart streams whose worker died without a stop request.
    ///
    /// Called by the health monitor once per tick. Returns the number of
    /// restart attempts made.
    pub async fn recover_exited(&self) -> usize {
        let slots = self.slots().await;
        join_all(slots.iter().map(|slot| self.recover(slot)))
            .await
            .into_iter()
            .filter(|attempted| *attempted)
            .count()
    }

    async fn recover(&self, slot: &Arc<StreamSlot>) -> bool {
        let _op = slot.op.lock().await;
        let name = &slot.definition.name;

        let (exited_at, restarts, dead) = {
            let mut state = slot.state.lock().await;
            if state.removed {
                return false;
            }
            let mut dead = None;
            if state.active {
                if !state.worker.as_mut().is_none_or(WorkerHandle::has_exited) {
                    return false;
                }
                state.mark_exited();
                dead = state.worker.take();
                warn!(stream = %name, "Worker found dead while stream was active");
                self.events.broadcast(StreamEvent::exited(name));
            }
            match state.exited_at {
                Some(at) => (at, state.restart_count, dead),
                None => return false,
            }
        };
        if let Some(worker) = dead {
            self.supervisor.terminate(worker).await;
        }

        if !self.restart.allows(restarts) {
            slot.state.lock().await.exited_at = None;
            error!(stream = %name, attempts = restarts, "Restart limit reached; giving up");
            self.events.broadcast(StreamEvent::gave_up(name, restarts));
            return false;
        }

        let delay = self.restart.backoff.next(restarts);
        if exited_at.elapsed() < delay {
            debug!(stream = %name, ?delay, "Restart deferred by backoff");
            return false;
        }

        let attempt = {
            let mut state = slot.state.lock().await;
            state.restart_count += 1;
            state.restart_count
        };

        info!(stream = %name, attempt, "Restarting stream");
        self.events.broadcast(StreamEvent::restarting(name, attempt));

        if let Err(e) = self.start_locked(slot).await {
            warn!(stream = %name, attempt, error = %e, "Restart failed");
            slot.state.lock().await.exited_at = Some(Instant::now());
        }
        true
    }

    /// Start path shared by user requests and self-healing.
    /// Caller must hold the record's operation lock.
    async fn start_locked(&self, slot: &Arc<StreamSlot>) -> StreamResult<()> {
        let name = &slot.definition.name;

        {
            let mut state = slot.state.lock().await;
            if state.removed {
                return Err(StreamError::NotFound(name.clone()));
            }
            if state.active {
                debug!(stream = %name, "Start requested for active stream");
                return Ok(());
            }

            let generation = state.generation + 1;
            let sink = Arc::new(RecordSink {
                slot: Arc::clone(slot),
                generation,
                events: self.events.clone(),
                supervisor: Arc::clone(&self.supervisor),
            });

            // The reader cannot touch the record until this guard drops,
            // so an instant exit is always observed after activation.
            let worker = self.supervisor.spawn(&slot.definition, sink)?;
            let pid = worker.pid();

            state.generation = generation;
            state.active = true;
            state.metrics.clear();
            state.phase = ConnectionPhase::Unknown;
            state.exited_at = None;
            state.worker = Some(worker);

            // Published under the guard so `Started` precedes any `Exited`
            // from the reader.
            self.events.broadcast(StreamEvent::started(name, pid));
        }
        Ok(())
    }

    /// Caller must hold the record's operation lock.
    async fn stop_locked(&self, slot: &StreamSlot) {
        let name = &slot.definition.name;

        let (was_active, worker) = {
            let mut state = slot.state.lock().await;
            let was_active = state.active;
            state.deactivate();
            state.exited_at = None;
            state.restart_count = 0;
            (was_active, state.worker.take())
        };

        if let Some(worker) = worker {
            self.supervisor.terminate(worker).await;
        }

        if was_active {
            info!(stream = %name, "Stream stopped");
            self.events.broadcast(StreamEvent::stopped(name));
        }
    }

    async fn slot(&self, name: &str) -> StreamResult<Arc<StreamSlot>> {
        self.streams
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| StreamError::NotFound(name.to_string()))
    }

    async fn slots(&self) -> Vec<Arc<StreamSlot>> {
        self.streams.read().await.values().cloned().collect()
    }

    async fn view(&self, slot: &StreamSlot) -> StatusView {
        let definition = &slot.definition;
        let state = slot.state.lock().await;
        let worker = state.worker.as_ref().filter(|_| state.active);

        StatusView {
            name: definition.name.clone(),
            source: definition.source.clone(),
            url: definition.outbound_url(&self.public_host),
            active: state.active,
            metrics: state.metrics.clone(),
            connection_phase: state.phase,
            restart_count: state.restart_count,
            pid: worker.and_then(WorkerHandle::pid),
            started_at: worker.map(WorkerHandle::started_at),
        }
    }
}

impl std::fmt::Debug for StreamRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamRegistry")
            .field("supervisor", &self.supervisor)
            .field("public_host", &self.public_host)
            .field("restart", &self.restart)
            .finish_non_exhaustive()
    }
}
