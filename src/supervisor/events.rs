//! Observable supervisor events.

use serde::Serialize;

/// Published on the supervisor's broadcast channel.
///
/// Events are advisory: nothing in the supervisor waits on a subscriber,
/// and a lagging subscriber simply misses events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupervisorEvent {
    /// The merged config was written to the output path.
    ConfigApplied,
    /// Merging failed; the server launches with the existing output config.
    ConfigFallback { reason: String },
    Spawned { pid: Option<u32> },
    SpawnFailed { reason: String },
    /// The readiness marker was seen; `start()` resolved.
    Ready,
    StartFailed { reason: String },
    Exited { code: Option<i32> },
    StopRequested,
}
