//! Supervisor error definitions.

use thiserror::Error;

use crate::server_config::DocumentError;

/// Errors returned by [`OrientDbServer`](crate::supervisor::OrientDbServer) operations.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Merging or writing the server config failed. `start()` logs this and
    /// falls back to whatever config already exists at the output path.
    #[error("couldn't configure the server: {0}")]
    Config(#[from] DocumentError),

    /// The executable could not be spawned. Recorded, then reported by the
    /// startup timeout.
    #[error("couldn't spawn {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// No readiness marker within the startup timeout.
    #[error("couldn't start the server in time: {details}")]
    StartTimeout { details: String },

    /// `stop()` was called on this instance; it will not start again.
    #[error("close has been requested")]
    CloseRequested,

    /// The child was still alive when the stop grace period ran out.
    #[error("couldn't stop the server within {grace_ms} ms")]
    StopTimeout { grace_ms: u64 },

    /// Test seam: the supervisor is in [`MockMode::Failure`](crate::supervisor::MockMode::Failure).
    #[error("mock test: failure")]
    MockFailure,

    /// The start attempt's observers went away before settling it
    /// (e.g. the runtime shut down).
    #[error("start attempt was abandoned")]
    Abandoned,
}

/// Result type for supervisor operations.
pub type SupervisorResult<T> = Result<T, SupervisorError>;
