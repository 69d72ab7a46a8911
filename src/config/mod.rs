//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! supervisor.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig
//!     → schema.rs resolve_paths() → ServerPaths (immutable, owned by the supervisor)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults so an empty file (or no file) is a valid config
//! - Every path is independently overridable; unset paths derive from the root
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::ObservabilityConfig;
pub use schema::ServerPaths;
pub use schema::SupervisorConfig;
pub use validation::{validate_config, ValidationError};
