//! Value types carried into the server configuration document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Credentials for one server user, keyed by user name in a [`UserMap`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserCredentials {
    /// Plain-text password written into the `password` attribute.
    pub password: String,

    /// Comma-separated capability list (e.g. `"connect,server.listDatabases"` or `"*"`).
    #[serde(default)]
    pub resources: String,
}

impl UserCredentials {
    pub fn new(password: impl Into<String>, resources: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            resources: resources.into(),
        }
    }
}

/// A `<user>` element as read back from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserEntry {
    pub name: String,
    pub password: String,
    pub resources: String,
}

/// A property value. Rendered into the `value` attribute with [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Float(x) => write!(f, "{}", x),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(x: f64) -> Self {
        PropertyValue::Float(x)
    }
}

/// An `<entry>` element of the `<properties>` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PropertyEntry {
    pub name: String,
    pub value: String,
}

/// Users to install, keyed by user name, in the order they were given.
pub type UserMap = IndexMap<String, UserCredentials>;

/// Properties to upsert, keyed by camelCase name, in the order they were given.
pub type PropertyMap = IndexMap<String, PropertyValue>;
