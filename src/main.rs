//! OrientDB supervisor (v1)
//!
//! Launches the OrientDB server shipped under `<root>/orientdb`, injects
//! users and properties into its config first, waits for it to report
//! ready, and stops it again on Ctrl+C.
//!
//! # Architecture Overview
//!
//! ```text
//!   supervisor.toml ──▶ config ──▶ SupervisorConfig ──▶ OrientDbServer
//!                                                          │
//!        <root>/config/orientdb-server-config.xml          │ start()
//!                 │                                        ▼
//!                 └──▶ server_config (merge users/props) ──▶ <root>/orientdb/config/...
//!                                                          │
//!                                                          ▼
//!                                        spawn <root>/orientdb/bin/server.sh
//!                                          stderr ──▶ readiness probe ──▶ Running
//!                                                          │
//!   Ctrl+C ──▶ lifecycle::signals ──▶ registry::stop_all ──▶ SIGHUP ──▶ Closed
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::sync::broadcast::{self, error::RecvError};

use orientdb_supervisor::config::{
    load_config, validate_config, ConfigError, ServerPaths, SupervisorConfig,
};
use orientdb_supervisor::lifecycle::registry;
use orientdb_supervisor::observability::{logging, metrics};
use orientdb_supervisor::supervisor::{OrientDbServer, SupervisorEvent};

#[derive(Parser)]
#[command(name = "orientdb-supervisor")]
#[command(about = "Launch and supervise an OrientDB server", long_about = None)]
struct Cli {
    /// Supervisor config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root directory; overrides `root_path`
    #[arg(long)]
    root: Option<PathBuf>,

    /// Echo the server's stdout/stderr
    #[arg(long)]
    pipe: bool,

    /// Verbose logging
    #[arg(long)]
    debug: bool,

    /// Startup timeout in milliseconds; overrides `start_timeout_ms`
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server and keep it running until Ctrl+C
    Run,
    /// Write the merged server config without starting anything
    Configure,
    /// Print the resolved configuration as JSON
    PrintConfig,
}

#[derive(Serialize)]
struct ResolvedConfig<'a> {
    config: &'a SupervisorConfig,
    paths: ServerPaths,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => SupervisorConfig::default(),
    };
    if let Some(root) = cli.root {
        config.root_path = Some(root);
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.start_timeout_ms = timeout_ms;
    }
    config.pipe |= cli.pipe;
    config.debug |= cli.debug;
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level, config.debug);
    tracing::info!("orientdb-supervisor v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    match cli.command {
        Commands::Run => run(config).await,
        Commands::Configure => configure(config).await,
        Commands::PrintConfig => {
            let resolved = ResolvedConfig {
                paths: config.resolve_paths(),
                config: &config,
            };
            println!("{}", serde_json::to_string_pretty(&resolved)?);
            Ok(())
        }
    }
}

async fn run(config: SupervisorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let server = OrientDbServer::new(config);
    let mut events = server.subscribe();

    if let Err(e) = server.start().await {
        tracing::error!(error = %e, "Couldn't start the server");
        registry::stop_all().await;
        return Err(e.into());
    }
    tracing::info!(pid = ?server.pid(), "OrientDB server running, press Ctrl+C to stop");

    tokio::select! {
        _ = registry::shutdown().wait() => {
            // the interrupt handler already stopped every registered server
            tracing::info!("Shutdown complete");
            return Ok(());
        }
        _ = wait_for_exit(&mut events) => {
            tracing::warn!("OrientDB server exited on its own");
        }
    }

    match server.stop().await {
        Some(Err(e)) => {
            tracing::error!(error = %e, "Stop failed");
            Err(e.into())
        }
        _ => {
            tracing::info!("Shutdown complete");
            Ok(())
        }
    }
}

async fn configure(config: SupervisorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let server = OrientDbServer::new(config);
    server.configure().await?;
    println!("{}", server.paths().output_server_config.display());
    Ok(())
}

async fn wait_for_exit(events: &mut broadcast::Receiver<SupervisorEvent>) {
    loop {
        match events.recv().await {
            Ok(SupervisorEvent::Exited { .. }) | Err(RecvError::Closed) => return,
            Ok(_) | Err(RecvError::Lagged(_)) => continue,
        }
    }
}
