//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (registry.rs):
//!     OrientDbServer::new → register(id, weak ref) → Registration guard
//!     drop(OrientDbServer) → guard drops → entry removed, live child hung up
//!
//! Signals (signals.rs):
//!     SIGINT → stop_all() → Shutdown::trigger()
//!
//! Host exit:
//!     host calls registry::stop_all() before returning from main
//! ```
//!
//! # Design Decisions
//! - One handler for the whole process, not one per supervisor
//! - Registry holds weak references; it never keeps a supervisor alive
//! - No child process may outlive the host

pub mod registry;
pub mod shutdown;
pub mod signals;

pub use registry::{stop_all, Registration, Registry, Stoppable};
pub use shutdown::Shutdown;
pub use signals::install_interrupt_handler;
