//! OrientDB process supervision.
//!
//! # Data Flow
//! ```text
//! start():
//!     mock? → already active? → close requested? → Starting
//!     → server_config merge (failure falls back to existing config)
//!     → spawn <runtime>/bin/server.sh
//!     → stderr lines → ReadinessProbe → Running, start() resolves
//!     → timer → start() fails if still pending
//!     → exit watcher → Closed
//!
//! stop():
//!     close_requested = true → SIGHUP → wait grace → exited?
//! ```
//!
//! # Design Decisions
//! - `start()` settles exactly once; the readiness watcher and the timer race on a
//!   single-assignment cell and only the winner moves the phase
//! - The exit watcher always records `Closed`; it is the source of truth for liveness
//! - Stop never escalates to a forced kill
//! - Readiness is a pluggable predicate over stderr lines

mod child;
pub mod error;
pub mod events;
pub mod readiness;
pub mod server;
pub(crate) mod signal;
pub mod state;

pub use error::{SupervisorError, SupervisorResult};
pub use events::SupervisorEvent;
pub use readiness::{MarkerProbe, ReadinessProbe, DEFAULT_READY_MARKER};
pub use server::OrientDbServer;
pub use state::{MockMode, Phase};
