//! OrientDB server configuration injection.
//!
//! # Data Flow
//! ```text
//! <input>/orientdb-server-config.xml
//!     → document.rs (read + parse into an owned tree)
//!     → merge.rs (replace users, upsert properties)
//!     → document.rs (serialize + write)
//!     → <output>/orientdb-server-config.xml
//! ```
//!
//! # Design Decisions
//! - The input template is never written to
//! - Merge functions take the document by `&mut` and cannot fail
//! - Only `<users>` and `<properties>` are touched; all other XML passes through

pub mod document;
pub mod merge;
pub mod types;

pub use document::{DocumentError, ServerConfigDocument};
pub use merge::{camel_to_dot, merge_config_file, merge_properties, merge_users, set_property};
pub use types::{PropertyEntry, PropertyMap, PropertyValue, UserCredentials, UserEntry, UserMap};
