//! OrientDB server supervisor library

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod server_config;
pub mod supervisor;

pub use config::schema::SupervisorConfig;
pub use lifecycle::Shutdown;
pub use server_config::{PropertyValue, UserCredentials};
pub use supervisor::{MockMode, OrientDbServer, Phase, SupervisorError, SupervisorEvent};
