//! Single-assignment start result.
//!
//! The readiness watcher and the startup timer race to settle a pending
//! `start()`. Whichever calls [`StartSignal::settle`] first wins; later
//! calls return `false` and change nothing.

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;

use crate::supervisor::error::{SupervisorError, SupervisorResult};

#[derive(Debug, Clone)]
pub(crate) struct StartSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<SupervisorResult<bool>>>>>,
}

impl StartSignal {
    pub(crate) fn new() -> (Self, StartOutcome) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                tx: Arc::new(Mutex::new(Some(tx))),
            },
            StartOutcome { rx },
        )
    }

    /// Settle with `result` if nobody has yet. Returns whether this call won.
    pub(crate) fn settle(&self, result: SupervisorResult<bool>) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => {
                // The caller may have given up on start(); the settlement still counts.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Receiving half awaited by `start()`.
#[derive(Debug)]
pub(crate) struct StartOutcome {
    rx: oneshot::Receiver<SupervisorResult<bool>>,
}

impl StartOutcome {
    pub(crate) async fn wait(self) -> SupervisorResult<bool> {
        self.rx.await.unwrap_or(Err(SupervisorError::Abandoned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_settlement_wins() {
        let (signal, outcome) = StartSignal::new();
        assert!(signal.is_pending());

        assert!(signal.settle(Ok(true)));
        assert!(!signal.settle(Err(SupervisorError::StartTimeout {
            details: "timeout".into()
        })));
        assert!(!signal.is_pending());

        assert!(outcome.wait().await.unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_the_cell() {
        let (signal, outcome) = StartSignal::new();
        let timer = signal.clone();

        assert!(timer.settle(Err(SupervisorError::CloseRequested)));
        assert!(!signal.settle(Ok(true)));
        assert!(matches!(outcome.wait().await, Err(SupervisorError::CloseRequested)));
    }

    #[tokio::test]
    async fn test_dropped_signal_abandons_start() {
        let (signal, outcome) = StartSignal::new();
        drop(signal);
        assert!(matches!(outcome.wait().await, Err(SupervisorError::Abandoned)));
    }
}
