//! Host-exit cleanup through the process-wide registry.
//!
//! Kept in its own test binary: `stop_all` reaches every supervisor in the
//! process.

#![cfg(unix)]

use orientdb_supervisor::lifecycle::registry;
use orientdb_supervisor::{OrientDbServer, SupervisorError};

mod common;
use common::{TestRoot, READY_SCRIPT};

#[tokio::test]
async fn test_stop_all_stops_every_live_server() {
    let root_a = TestRoot::new(READY_SCRIPT);
    let root_b = TestRoot::new(READY_SCRIPT);
    let a = OrientDbServer::new(root_a.config());
    let b = OrientDbServer::new(root_b.config());
    let never_started = OrientDbServer::new(TestRoot::bare().config());

    assert!(a.start().await.unwrap());
    assert!(b.start().await.unwrap());

    assert_eq!(registry::stop_all().await, 3);

    assert!(a.is_closed());
    assert!(b.is_closed());
    assert!(never_started.close_requested());
    assert!(matches!(a.start().await, Err(SupervisorError::CloseRequested)));

    drop(a);
    drop(b);
    drop(never_started);
    assert_eq!(registry::stop_all().await, 0);
}
