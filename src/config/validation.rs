//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, grace shorter than startup timeout)
//! - Reject empty user names and property keys
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - The XML template itself is not validated

use thiserror::Error;

use crate::config::schema::SupervisorConfig;

/// A single semantic problem in a [`SupervisorConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start_timeout_ms must be greater than zero")]
    ZeroStartTimeout,

    #[error("stop_grace_ms must be greater than zero")]
    ZeroStopGrace,

    #[error("stop_grace_ms ({grace_ms}) must be shorter than start_timeout_ms ({timeout_ms})")]
    GraceExceedsTimeout { grace_ms: u64, timeout_ms: u64 },

    #[error("user names must not be empty")]
    EmptyUserName,

    #[error("property keys must not be empty")]
    EmptyPropertyKey,

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),
}

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.start_timeout_ms == 0 {
        errors.push(ValidationError::ZeroStartTimeout);
    }
    if config.stop_grace_ms == 0 {
        errors.push(ValidationError::ZeroStopGrace);
    }
    if config.start_timeout_ms > 0 && config.stop_grace_ms >= config.start_timeout_ms {
        errors.push(ValidationError::GraceExceedsTimeout {
            grace_ms: config.stop_grace_ms,
            timeout_ms: config.start_timeout_ms,
        });
    }
    if config.users.keys().any(|name| name.trim().is_empty()) {
        errors.push(ValidationError::EmptyUserName);
    }
    if config.properties.keys().any(|key| key.trim().is_empty()) {
        errors.push(ValidationError::EmptyPropertyKey);
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(config.observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
