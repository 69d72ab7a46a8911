//! Metrics collection and exposition.
//!
//! # Metrics
//! - `orientdb_supervisor_starts_total` (counter): start attempts by outcome
//!   (`ready`, `timeout`, `closed`, `mock`)
//! - `orientdb_supervisor_config_fallbacks_total` (counter): merges that failed
//!   and fell back to the existing output config
//! - `orientdb_supervisor_spawn_errors_total` (counter)
//! - `orientdb_supervisor_child_exits_total` (counter)
//! - `orientdb_supervisor_running` (gauge): 1 while a child is ready
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is only installed by the binary, on request

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn register_metrics() {
    describe_counter!("orientdb_supervisor_starts_total", "Start attempts by outcome");
    describe_counter!(
        "orientdb_supervisor_config_fallbacks_total",
        "Config merges that failed and fell back to the existing config"
    );
    describe_counter!("orientdb_supervisor_spawn_errors_total", "Child spawn failures");
    describe_counter!("orientdb_supervisor_child_exits_total", "Observed child exits");
    describe_gauge!("orientdb_supervisor_running", "1 while the supervised server is ready");
}

pub fn record_start(outcome: &'static str) {
    counter!("orientdb_supervisor_starts_total", "outcome" => outcome).increment(1);
}

pub fn record_config_fallback() {
    counter!("orientdb_supervisor_config_fallbacks_total").increment(1);
}

pub fn record_spawn_error() {
    counter!("orientdb_supervisor_spawn_errors_total").increment(1);
}

pub fn record_child_exit() {
    counter!("orientdb_supervisor_child_exits_total").increment(1);
}

pub fn set_running(running: bool) {
    gauge!("orientdb_supervisor_running").set(if running { 1.0 } else { 0.0 });
}
