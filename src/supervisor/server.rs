//! The supervised OrientDB server handle.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::config::{ServerPaths, SupervisorConfig};
use crate::lifecycle::registry::{self, Registration, Stoppable};
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::server_config::merge_config_file;
use crate::supervisor::error::{SupervisorError, SupervisorResult};
use crate::supervisor::events::SupervisorEvent;
use crate::supervisor::readiness::{MarkerProbe, ReadinessProbe};
use crate::supervisor::signal::StartSignal;
use crate::supervisor::state::{ChildHandle, MockMode, Phase, SupervisorState};

const EVENT_CAPACITY: usize = 64;

/// Shared core. Observer tasks hold an `Arc` to it; the registry holds a `Weak`.
pub(crate) struct SupervisorInner {
    pub(crate) id: Uuid,
    pub(crate) config: SupervisorConfig,
    pub(crate) paths: ServerPaths,
    pub(crate) probe: Arc<dyn ReadinessProbe>,
    state: Mutex<SupervisorState>,
    events: broadcast::Sender<SupervisorEvent>,
}

impl SupervisorInner {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SupervisorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self, event: SupervisorEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn configure(&self) -> SupervisorResult<()> {
        merge_config_file(
            &self.paths.input_server_config,
            &self.paths.output_server_config,
            &self.config.users,
            &self.config.properties,
        )
        .await?;
        Ok(())
    }

    /// Merge the config; on failure keep whatever is already at the output path.
    async fn configure_or_fallback(&self) {
        match self.configure().await {
            Ok(()) => {
                tracing::debug!(
                    output = %self.paths.output_server_config.display(),
                    "Successfully configured"
                );
                self.publish(SupervisorEvent::ConfigApplied);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    output = %self.paths.output_server_config.display(),
                    "Failed to configure, falling back to existing config"
                );
                metrics::record_config_fallback();
                self.publish(SupervisorEvent::ConfigFallback {
                    reason: e.to_string(),
                });
            }
        }
    }

    async fn start(self: &Arc<Self>) -> SupervisorResult<bool> {
        signals::install_interrupt_handler();

        let (attempt, signal, outcome) = {
            let mut state = self.lock_state();
            match state.mock {
                Some(MockMode::Success) => {
                    metrics::record_start("mock");
                    return Ok(true);
                }
                Some(MockMode::Failure) => return Err(SupervisorError::MockFailure),
                None => {}
            }
            if state.phase.is_active() {
                tracing::debug!(phase = %state.phase, "Server is already running");
                return Ok(true);
            }
            if state.close_requested {
                return Err(SupervisorError::CloseRequested);
            }
            state.phase = Phase::Starting;
            state.errors.clear();
            state.attempt += 1;

            // The timer owns the way out of Starting from here on, even if
            // the caller drops this future.
            let (signal, outcome) = StartSignal::new();
            tokio::spawn(self.clone().arm_timer(state.attempt, signal.clone()));
            (state.attempt, signal, outcome)
        };

        let outcome = outcome.wait();
        tokio::pin!(outcome);

        tokio::select! {
            result = &mut outcome => return result,
            () = self.configure_or_fallback() => {}
        }

        {
            let mut state = self.lock_state();
            if state.close_requested && signal.settle(Err(SupervisorError::CloseRequested)) {
                if state.is_current(attempt) && state.phase == Phase::Starting {
                    state.phase = Phase::Idle;
                }
                metrics::record_start("closed");
            }
        }

        self.launch(attempt, &signal);
        outcome.await
    }

    async fn stop(&self) -> Option<SupervisorResult<bool>> {
        let signalled = {
            let mut state = self.lock_state();
            state.close_requested = true;
            if !state.ever_spawned {
                tracing::debug!("Stop requested before any server process was spawned");
                return None;
            }
            match state.child.as_ref().map(ChildHandle::hang_up) {
                Some(result) => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to signal server process");
                    }
                    state.phase = Phase::Stopping;
                    true
                }
                None => false,
            }
        };
        self.publish(SupervisorEvent::StopRequested);

        if signalled {
            tokio::time::sleep(self.config.stop_grace()).await;
        }

        let still_alive = self.lock_state().child.is_some();
        if still_alive {
            tracing::warn!(grace_ms = self.config.stop_grace_ms, "Couldn't stop the server");
            Some(Err(SupervisorError::StopTimeout {
                grace_ms: self.config.stop_grace_ms,
            }))
        } else {
            tracing::info!("Server stopped");
            Some(Ok(true))
        }
    }
}

impl Stoppable for SupervisorInner {
    fn label(&self) -> String {
        format!("orientdb[{}]@{}", self.id, self.paths.runtime.display())
    }

    fn stop_async(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            if let Some(Err(e)) = self.stop().await {
                tracing::warn!(
                    error = %e,
                    target = %self.label(),
                    "Registered supervisor did not stop"
                );
            }
        })
    }

    fn hang_up(&self) {
        let state = self.lock_state();
        if let Some(child) = state.child.as_ref() {
            if let Err(e) = child.hang_up() {
                tracing::debug!(pid = ?child.pid, error = %e, "Hang-up on drop failed");
            }
        }
    }
}

/// Supervises one OrientDB server process.
///
/// Construction registers the instance with the process-wide registry, so
/// an interrupt or [`registry::stop_all`] stops its child. Dropping the
/// handle sends a live child SIGHUP.
pub struct OrientDbServer {
    inner: Arc<SupervisorInner>,
    registration: Registration,
}

impl OrientDbServer {
    /// Supervisor using the default "OrientDB Server is active" readiness marker.
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_probe(config, MarkerProbe::default())
    }

    /// Supervisor with a custom readiness probe.
    pub fn with_probe(config: SupervisorConfig, probe: impl ReadinessProbe + 'static) -> Self {
        let paths = config.resolve_paths();
        tracing::debug!(
            root = %paths.root.display(),
            runtime = %paths.runtime.display(),
            input_config = %paths.input_config.display(),
            output_config = %paths.output_config.display(),
            database = %paths.database.display(),
            executable = %paths.executable.display(),
            "Supervisor paths resolved"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let inner = Arc::new(SupervisorInner {
            id: Uuid::new_v4(),
            config,
            paths,
            probe: Arc::new(probe),
            state: Mutex::new(SupervisorState::new()),
            events,
        });

        let target: Arc<dyn Stoppable> = inner.clone();
        let registration = registry::register(inner.id, Arc::downgrade(&target));
        signals::install_interrupt_handler();

        Self { inner, registration }
    }

    /// Launch the server and wait until it reports ready.
    ///
    /// Resolves `Ok(true)` once the readiness marker is seen, or at once if a
    /// start is already underway or done. Fails with
    /// [`SupervisorError::StartTimeout`] if the marker does not show up in
    /// time, and with [`SupervisorError::CloseRequested`] after [`stop`](Self::stop).
    /// The timeout counts from the moment the attempt begins, config merge
    /// included; dropping the returned future does not cancel it.
    pub async fn start(&self) -> SupervisorResult<bool> {
        self.inner.start().await
    }

    /// Send the child SIGHUP and wait out the grace period.
    ///
    /// Returns `None` if no process was ever spawned. Either way, every
    /// later `start()` on this instance fails.
    pub async fn stop(&self) -> Option<SupervisorResult<bool>> {
        self.inner.stop().await
    }

    /// Merge users and properties into the output config, without launching.
    pub async fn configure(&self) -> SupervisorResult<()> {
        self.inner.configure().await
    }

    pub fn set_mock(&self, mock: Option<MockMode>) {
        self.inner.lock_state().mock = mock;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SupervisorEvent> {
        self.inner.events.subscribe()
    }

    pub fn id(&self) -> Uuid {
        self.registration.id()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock_state().phase
    }

    pub fn is_starting(&self) -> bool {
        self.phase() == Phase::Starting
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn is_closed(&self) -> bool {
        self.phase() == Phase::Closed
    }

    pub fn close_requested(&self) -> bool {
        self.inner.lock_state().close_requested
    }

    /// Errors accumulated by the current start attempt.
    pub fn errors(&self) -> Vec<String> {
        self.inner.lock_state().errors.clone()
    }

    /// Pid of the live child, if any.
    pub fn pid(&self) -> Option<u32> {
        self.inner.lock_state().child.as_ref().and_then(|c| c.pid)
    }

    pub fn paths(&self) -> &ServerPaths {
        &self.inner.paths
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.inner.config
    }
}

impl Drop for OrientDbServer {
    fn drop(&mut self) {
        self.inner.hang_up();
    }
}

impl std::fmt::Debug for OrientDbServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrientDbServer")
            .field("id", &self.inner.id)
            .field("executable", &self.inner.paths.executable)
            .field("phase", &self.phase())
            .finish()
    }
}
