//! Configuration schema definitions.
//!
//! This module defines the complete configuration bundle for a supervised
//! OrientDB server. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::server_config::{PropertyMap, UserMap};

/// Extension of the launcher script shipped in `<runtime>/bin`.
#[cfg(windows)]
pub const SERVER_SCRIPT_EXTENSION: &str = "bat";
#[cfg(not(windows))]
pub const SERVER_SCRIPT_EXTENSION: &str = "sh";

pub const SERVER_CONFIG_FILE: &str = "orientdb-server-config.xml";
pub const HAZELCAST_CONFIG_FILE: &str = "hazelcast.xml";

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Verbose logging of paths and child process events.
    pub debug: bool,

    /// Base directory for every path below that is not set explicitly.
    /// Defaults to the current working directory.
    pub root_path: Option<PathBuf>,

    /// OrientDB distribution directory (default `<root>/orientdb`).
    pub runtime_path: Option<PathBuf>,

    /// Directory holding the config templates (default `<root>/config`).
    pub input_config_path: Option<PathBuf>,

    /// Directory the merged config is written to (default `<root>/orientdb/config`).
    pub output_config_path: Option<PathBuf>,

    /// Database directory (default `<root>/orientdb/databases`).
    pub database_path: Option<PathBuf>,

    /// How long `start()` waits for the readiness marker, in milliseconds.
    pub start_timeout_ms: u64,

    /// How long `stop()` waits for the child to exit, in milliseconds.
    pub stop_grace_ms: u64,

    /// Echo the child's stdout/stderr to our own.
    pub pipe: bool,

    /// Server properties keyed by camelCase name.
    pub properties: PropertyMap,

    /// Server users keyed by user name.
    pub users: UserMap,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            debug: false,
            root_path: None,
            runtime_path: None,
            input_config_path: None,
            output_config_path: None,
            database_path: None,
            start_timeout_ms: 3000,
            stop_grace_ms: 1000,
            pipe: false,
            properties: PropertyMap::new(),
            users: UserMap::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl SupervisorConfig {
    /// Config rooted at `root` with every other option left at its default.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_millis(self.start_timeout_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    /// Resolve every path, filling defaults relative to the root.
    pub fn resolve_paths(&self) -> ServerPaths {
        let root = self
            .root_path
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));

        let runtime = self.runtime_path.clone().unwrap_or_else(|| root.join("orientdb"));
        let input_config = self
            .input_config_path
            .clone()
            .unwrap_or_else(|| root.join("config"));
        let output_config = self
            .output_config_path
            .clone()
            .unwrap_or_else(|| root.join("orientdb").join("config"));
        let database = self
            .database_path
            .clone()
            .unwrap_or_else(|| root.join("orientdb").join("databases"));

        ServerPaths::new(root, runtime, input_config, output_config, database)
    }
}

/// Resolved, immutable path set for one supervised server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerPaths {
    pub root: PathBuf,
    pub runtime: PathBuf,
    pub input_config: PathBuf,
    pub output_config: PathBuf,
    pub database: PathBuf,

    /// `<runtime>/bin/server.<sh|bat>`.
    pub executable: PathBuf,

    pub input_server_config: PathBuf,
    pub output_server_config: PathBuf,

    /// Computed for completeness; never merged.
    pub input_hazelcast_config: PathBuf,
    pub output_hazelcast_config: PathBuf,
}

impl ServerPaths {
    fn new(
        root: PathBuf,
        runtime: PathBuf,
        input_config: PathBuf,
        output_config: PathBuf,
        database: PathBuf,
    ) -> Self {
        let executable = runtime
            .join("bin")
            .join(format!("server.{}", SERVER_SCRIPT_EXTENSION));

        Self {
            input_server_config: input_config.join(SERVER_CONFIG_FILE),
            output_server_config: output_config.join(SERVER_CONFIG_FILE),
            input_hazelcast_config: input_config.join(HAZELCAST_CONFIG_FILE),
            output_hazelcast_config: output_config.join(HAZELCAST_CONFIG_FILE),
            executable,
            root,
            runtime,
            input_config,
            output_config,
            database,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
