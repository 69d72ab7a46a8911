//! Process-wide registry of live supervisors.
//!
//! Every supervisor registers itself on construction and deregisters when
//! its [`Registration`] guard drops. One interrupt handler (see
//! `signals.rs`) walks the registry instead of each instance installing its
//! own.

use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, OnceLock, Weak};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::lifecycle::shutdown::Shutdown;

/// Something the registry can stop on host exit.
pub trait Stoppable: Send + Sync + 'static {
    /// Label used in logs.
    fn label(&self) -> String;

    /// Stop asynchronously, waiting for the child to go away.
    fn stop_async(self: Arc<Self>) -> Pin<Box<dyn Future<Output = ()> + Send>>;

    /// Best-effort synchronous termination signal, for paths that cannot await.
    fn hang_up(&self);
}

type Entries = DashMap<Uuid, Weak<dyn Stoppable>>;

/// Set of live supervisors plus the host-facing shutdown notification.
pub struct Registry {
    entries: Arc<Entries>,
    shutdown: Shutdown,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            shutdown: Shutdown::new(),
        }
    }

    /// The registry every supervisor joins.
    pub fn global() -> &'static Registry {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Registry::new)
    }

    /// Add `target` under `id`.
    pub fn register(&self, id: Uuid, target: Weak<dyn Stoppable>) -> Registration {
        self.entries.insert(id, target);
        tracing::trace!(id = %id, "Supervisor registered");
        Registration {
            id,
            entries: self.entries.clone(),
        }
    }

    pub fn is_registered(&self, id: Uuid) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live registrations.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fired after an interrupt has stopped everything.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    fn live_targets(&self) -> Vec<Arc<dyn Stoppable>> {
        // Collect first so no map shard stays locked across an await.
        self.entries
            .iter()
            .filter_map(|entry| entry.value().upgrade())
            .collect()
    }

    /// Stop every registered supervisor concurrently. Returns how many were stopped.
    pub async fn stop_all(&self) -> usize {
        let targets = self.live_targets();
        let count = targets.len();

        let mut set = JoinSet::new();
        for target in targets {
            tracing::debug!(target = %target.label(), "Stopping registered supervisor");
            set.spawn(target.stop_async());
        }
        while let Some(res) = set.join_next().await {
            if let Err(e) = res {
                tracing::warn!(error = %e, "Supervisor stop task failed");
            }
        }

        count
    }

    /// Send every registered child a termination signal without waiting.
    pub fn hang_up_all(&self) {
        for target in self.live_targets() {
            target.hang_up();
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII handle; dropping it removes the entry.
pub struct Registration {
    id: Uuid,
    entries: Arc<Entries>,
}

impl Registration {
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.entries.remove(&self.id);
        tracing::trace!(id = %self.id, "Supervisor deregistered");
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

pub fn register(id: Uuid, target: Weak<dyn Stoppable>) -> Registration {
    Registry::global().register(id, target)
}

pub fn is_registered(id: Uuid) -> bool {
    Registry::global().is_registered(id)
}

/// Stop every supervisor in the global registry.
pub async fn stop_all() -> usize {
    Registry::global().stop_all().await
}

pub fn hang_up_all() {
    Registry::global().hang_up_all()
}

pub fn shutdown() -> &'static Shutdown {
    Registry::global().shutdown()
}
