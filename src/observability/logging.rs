//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the binary
//! - Pick a default filter from the configured level and the debug flag
//!
//! # Design Decisions
//! - The library only emits `tracing` events; installing a subscriber is the host's call
//! - `RUST_LOG` always wins over the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter directive for a level, scoped to this crate.
pub fn default_directive(level: &str, debug: bool) -> String {
    let level = if debug { "debug" } else { level };
    format!("orientdb_supervisor={}", level.to_ascii_lowercase())
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(level: &str, debug: bool) -> bool {
    let directive = default_directive(level, debug);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_overrides_level() {
        assert_eq!(default_directive("warn", false), "orientdb_supervisor=warn");
        assert_eq!(default_directive("warn", true), "orientdb_supervisor=debug");
        assert_eq!(default_directive("INFO", false), "orientdb_supervisor=info");
    }
}
