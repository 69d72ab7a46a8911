//! OS signal handling.
//!
//! # Responsibilities
//! - Install one process-wide Ctrl+C (SIGINT) handler
//! - Stop every registered supervisor when it fires
//! - Then trigger the registry's host-facing shutdown notification
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - At most one live handler per process, however many supervisors exist
//! - Reinstalled when the runtime that hosted it has shut down
//! - Needs a running Tokio runtime; without one, installation is skipped

use std::sync::{Mutex, PoisonError};
use tokio::task::JoinHandle;

use crate::lifecycle::registry;

/// The live handler task, if any. A task whose runtime has shut down counts
/// as finished and gets replaced.
static INTERRUPT_HANDLER: Mutex<Option<JoinHandle<()>>> = Mutex::new(None);

/// Install the interrupt handler unless a live one exists.
///
/// Returns `true` only for the call that actually installed it.
pub fn install_interrupt_handler() -> bool {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        tracing::debug!("No Tokio runtime; interrupt handler not installed");
        return false;
    };

    let mut slot = INTERRUPT_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner);
    if slot.as_ref().is_some_and(|task| !task.is_finished()) {
        return false;
    }
    if slot.is_some() {
        tracing::debug!("Previous interrupt handler is gone, reinstalling");
    }

    *slot = Some(handle.spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        tracing::info!("Interrupt received, stopping supervised servers");
        let stopped = registry::stop_all().await;
        tracing::info!(stopped, "Supervised servers stopped");
        registry::shutdown().trigger();
    }));
    true
}

/// Whether a handler task is currently alive.
pub fn interrupt_handler_installed() -> bool {
    INTERRUPT_HANDLER
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
        .is_some_and(|task| !task.is_finished())
}
