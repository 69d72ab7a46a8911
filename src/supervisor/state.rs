//! Supervisor state machine.
//!
//! # State Transitions
//! ```text
//! Idle     → Starting: start()
//! Starting → Running:  readiness marker seen (start resolves Ok)
//! Starting → Idle:     startup timeout, no live child
//! Starting → Stopping: startup timeout with a live child (child is hung up)
//! Running  → Stopping: stop()
//! any      → Closed:   child exit observed
//! Closed   → Starting: start() again, unless close was requested
//! ```

use serde::Serialize;

/// Lifecycle phase of the supervised server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Starting,
    Running,
    Stopping,
    Closed,
}

impl Phase {
    /// A start is underway or done; another `start()` is a no-op.
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Starting | Phase::Running)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Starting => "starting",
            Phase::Running => "running",
            Phase::Stopping => "stopping",
            Phase::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Test seam that short-circuits `start()` without touching disk or spawning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    Success,
    Failure,
}

/// Handle to the one live child, by pid. The `Child` itself lives in the
/// exit watcher task.
#[derive(Debug)]
pub(crate) struct ChildHandle {
    pub(crate) pid: Option<u32>,
    pub(crate) attempt: u64,
    /// Kill request for the exit watcher; SIGHUP is sent directly on Unix.
    #[cfg_attr(unix, allow(dead_code))]
    pub(crate) kill_tx: tokio::sync::mpsc::UnboundedSender<()>,
}

impl ChildHandle {
    /// Ask the child to terminate: SIGHUP on Unix, a kill request elsewhere.
    pub(crate) fn hang_up(&self) -> std::io::Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            let Some(pid) = self.pid else {
                return Ok(());
            };
            signal::kill(Pid::from_raw(pid as i32), Signal::SIGHUP).map_err(std::io::Error::from)
        }

        #[cfg(not(unix))]
        {
            self.kill_tx.send(()).map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::BrokenPipe, "exit watcher has finished")
            })
        }
    }
}

/// Mutable record behind the supervisor's mutex.
#[derive(Debug)]
pub(crate) struct SupervisorState {
    pub(crate) phase: Phase,
    pub(crate) close_requested: bool,
    /// Spawn errors and early exits of the current attempt, oldest first.
    pub(crate) errors: Vec<String>,
    pub(crate) child: Option<ChildHandle>,
    pub(crate) ever_spawned: bool,
    /// Bumped by every real start attempt; observers carry the value they were armed with.
    pub(crate) attempt: u64,
    pub(crate) mock: Option<MockMode>,
}

impl SupervisorState {
    pub(crate) fn new() -> Self {
        Self {
            phase: Phase::Idle,
            close_requested: false,
            errors: Vec::new(),
            child: None,
            ever_spawned: false,
            attempt: 0,
            mock: None,
        }
    }

    /// Whether an observer armed for `attempt` may still move the phase.
    pub(crate) fn is_current(&self, attempt: u64) -> bool {
        self.attempt == attempt
    }

    /// Message for a startup timeout: the accumulated errors, or "timeout".
    pub(crate) fn timeout_details(&self) -> String {
        if self.errors.is_empty() {
            "timeout".to_string()
        } else {
            self.errors.join("\n")
        }
    }

    pub(crate) fn child_of(&self, attempt: u64) -> Option<&ChildHandle> {
        self.child.as_ref().filter(|c| c.attempt == attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_phases() {
        assert!(Phase::Starting.is_active());
        assert!(Phase::Running.is_active());
        assert!(!Phase::Idle.is_active());
        assert!(!Phase::Stopping.is_active());
        assert!(!Phase::Closed.is_active());
    }

    #[test]
    fn test_timeout_details() {
        let mut state = SupervisorState::new();
        assert_eq!(state.timeout_details(), "timeout");

        state.errors.push("spawn failed".into());
        state.errors.push("exited early".into());
        assert_eq!(state.timeout_details(), "spawn failed\nexited early");
    }

    #[test]
    fn test_child_of_matches_attempt() {
        let mut state = SupervisorState::new();
        let (kill_tx, _kill_rx) = tokio::sync::mpsc::unbounded_channel();
        state.child = Some(ChildHandle { pid: None, attempt: 2, kill_tx });

        assert!(state.child_of(2).is_some());
        assert!(state.child_of(1).is_none());
    }
}
