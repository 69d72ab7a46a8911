//! Child process spawning and observers.
//!
//! One start attempt arms up to four tasks, all tagged with the attempt
//! number they belong to:
//! - stdout reader: echoes when piping, otherwise drains
//! - stderr reader: echoes when piping, feeds lines to the readiness probe
//! - exit watcher: owns the `Child`, records the exit
//! - startup timer: armed by `start()` before the config merge, fails the
//!   attempt if it is still pending

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;

use crate::observability::metrics;
use crate::supervisor::error::SupervisorError;
use crate::supervisor::events::SupervisorEvent;
use crate::supervisor::server::SupervisorInner;
use crate::supervisor::signal::StartSignal;
use crate::supervisor::state::{ChildHandle, Phase};

impl SupervisorInner {
    /// Spawn the server and arm its output and exit observers for `attempt`.
    ///
    /// Skipped if the attempt was settled while the config was being merged.
    /// A spawn failure is recorded, not returned: the startup timer reports it.
    pub(crate) fn launch(self: &Arc<Self>, attempt: u64, signal: &StartSignal) {
        let executable = &self.paths.executable;
        let mut command = Command::new(executable);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Spawn under the state lock so the timer sees either no child or a
        // recorded one.
        let mut state = self.lock_state();
        if !signal.is_pending() || !state.is_current(attempt) || state.phase != Phase::Starting {
            tracing::debug!(attempt, "Start attempt already settled, not spawning");
            return;
        }

        match command.spawn() {
            Ok(mut child) => {
                let pid = child.id();
                let stdout = child.stdout.take();
                let stderr = child.stderr.take();
                let (kill_tx, kill_rx) = mpsc::unbounded_channel();

                state.child = Some(ChildHandle { pid, attempt, kill_tx });
                state.ever_spawned = true;
                drop(state);

                tracing::info!(
                    pid = ?pid,
                    executable = %executable.display(),
                    attempt,
                    "Server process spawned"
                );
                self.publish(SupervisorEvent::Spawned { pid });

                if let Some(stdout) = stdout {
                    tokio::spawn(self.clone().watch_stdout(stdout));
                }
                if let Some(stderr) = stderr {
                    tokio::spawn(self.clone().watch_stderr(stderr, attempt, signal.clone()));
                }
                tokio::spawn(self.clone().watch_exit(child, pid, attempt, kill_rx));
            }
            Err(source) => {
                let err = SupervisorError::Spawn {
                    path: executable.display().to_string(),
                    source,
                };
                state.errors.push(err.to_string());
                drop(state);

                tracing::warn!(error = %err, "Server process error");
                metrics::record_spawn_error();
                self.publish(SupervisorEvent::SpawnFailed {
                    reason: err.to_string(),
                });
            }
        }
    }

    async fn watch_stdout(self: Arc<Self>, stdout: ChildStdout) {
        let pipe = self.config.pipe;
        read_lines(stdout, |line| {
            if pipe {
                println!("{}", line);
            }
        })
        .await;
    }

    async fn watch_stderr(self: Arc<Self>, stderr: ChildStderr, attempt: u64, signal: StartSignal) {
        let pipe = self.config.pipe;
        read_lines(stderr, |line| {
            if pipe {
                eprintln!("{}", line);
            }
            if signal.is_pending() && self.probe.is_ready(line) {
                self.mark_ready(attempt, &signal);
            }
        })
        .await;
    }

    /// First readiness match of a pending, current attempt wins.
    fn mark_ready(&self, attempt: u64, signal: &StartSignal) {
        let mut state = self.lock_state();
        if !state.is_current(attempt) || state.phase != Phase::Starting || state.close_requested {
            return;
        }
        if !signal.settle(Ok(true)) {
            return;
        }
        state.phase = Phase::Running;
        drop(state);

        tracing::info!(attempt, "OrientDB server is active");
        metrics::record_start("ready");
        metrics::set_running(true);
        self.publish(SupervisorEvent::Ready);
    }

    async fn watch_exit(
        self: Arc<Self>,
        mut child: Child,
        pid: Option<u32>,
        attempt: u64,
        mut kill_rx: mpsc::UnboundedReceiver<()>,
    ) {
        let status = loop {
            tokio::select! {
                status = child.wait() => break status,
                Some(()) = kill_rx.recv() => {
                    if let Err(e) = child.start_kill() {
                        tracing::warn!(pid = ?pid, error = %e, "Failed to kill server process");
                    }
                }
            }
        };

        let code = status.as_ref().ok().and_then(ExitStatus::code);
        {
            let mut state = self.lock_state();
            if state.child_of(attempt).is_some() {
                state.child = None;
            }
            if state.is_current(attempt) {
                if state.phase == Phase::Starting {
                    let reason = match &status {
                        Ok(s) => format!("server exited before becoming ready ({})", s),
                        Err(e) => format!("lost track of server process: {}", e),
                    };
                    state.errors.push(reason);
                }
                state.phase = Phase::Closed;
            }
        }

        match &status {
            Ok(s) => tracing::info!(pid = ?pid, code = ?code, status = %s, "Server process exited"),
            Err(e) => tracing::warn!(pid = ?pid, error = %e, "Failed to wait on server process"),
        }
        metrics::record_child_exit();
        metrics::set_running(false);
        self.publish(SupervisorEvent::Exited { code });
    }

    /// Fail the attempt if nothing settled it within the startup timeout.
    pub(crate) async fn arm_timer(self: Arc<Self>, attempt: u64, signal: StartSignal) {
        tokio::time::sleep(self.config.start_timeout()).await;

        let mut state = self.lock_state();
        if !signal.is_pending() {
            return;
        }

        let (error, outcome) = if state.close_requested {
            (SupervisorError::CloseRequested, "closed")
        } else {
            let details = state.timeout_details();
            (SupervisorError::StartTimeout { details }, "timeout")
        };
        let reason = error.to_string();
        if !signal.settle(Err(error)) {
            return;
        }

        if state.is_current(attempt) && state.phase == Phase::Starting {
            // A child that never became ready must not linger into the next attempt.
            let hung_up = state.child_of(attempt).map(ChildHandle::hang_up);
            state.phase = match hung_up {
                Some(result) => {
                    if let Err(e) = result {
                        tracing::warn!(error = %e, "Failed to signal unready server process");
                    }
                    Phase::Stopping
                }
                None => Phase::Idle,
            };
        }
        drop(state);

        tracing::warn!(reason = %reason, attempt, "Server failed to start");
        metrics::record_start(outcome);
        self.publish(SupervisorEvent::StartFailed { reason });
    }
}

/// Feed each line of `reader` to `on_line`, tolerating invalid UTF-8.
async fn read_lines<R, F>(reader: R, mut on_line: F)
where
    R: AsyncRead + Unpin,
    F: FnMut(&str),
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\r', '\n']));
            }
            Err(e) => {
                tracing::debug!(error = %e, "Server output stream closed");
                break;
            }
        }
    }
}
