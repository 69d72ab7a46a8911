//! The `orientdb-server-config.xml` document.
//!
//! The XML is held as an owned element tree. Everything outside the
//! `<users>` and `<properties>` sections passes through untouched.

use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xmltree::{Element, EmitterConfig, XMLNode};

use crate::server_config::types::{PropertyEntry, UserEntry};

/// Root element name of an OrientDB server configuration.
pub const ROOT_ELEMENT: &str = "orient-server";
pub const USERS_SECTION: &str = "users";
pub const USER_ELEMENT: &str = "user";
pub const PROPERTIES_SECTION: &str = "properties";
pub const ENTRY_ELEMENT: &str = "entry";

/// Errors raised while reading, parsing or writing a configuration document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("couldn't open config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config document: {0}")]
    Parse(#[from] xmltree::ParseError),

    #[error("unexpected root element <{0}>, expected <{ROOT_ELEMENT}>")]
    UnexpectedRoot(String),

    #[error("couldn't serialize config document: {0}")]
    Serialize(#[from] xmltree::Error),

    #[error("couldn't write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DocumentError {
    /// True when the error came from reading or parsing the input template.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            DocumentError::Read { .. } | DocumentError::Parse(_) | DocumentError::UnexpectedRoot(_)
        )
    }
}

/// An owned OrientDB server configuration tree.
#[derive(Debug, Clone)]
pub struct ServerConfigDocument {
    root: Element,
}

impl ServerConfigDocument {
    /// Parse a document, requiring an `<orient-server>` root.
    pub fn parse<R: Read>(reader: R) -> Result<Self, DocumentError> {
        let root = Element::parse(reader)?;
        if root.name != ROOT_ELEMENT {
            return Err(DocumentError::UnexpectedRoot(root.name));
        }
        Ok(Self { root })
    }

    /// Read and parse a document from disk.
    pub async fn read(path: &Path) -> Result<Self, DocumentError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(bytes.as_slice())
    }

    /// Serialize to indented XML.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DocumentError> {
        let mut buf = Vec::new();
        let config = EmitterConfig::new().perform_indent(true);
        self.root.write_with_config(&mut buf, config)?;
        Ok(buf)
    }

    /// Serialize and write to `path`, creating its parent directory if needed.
    pub async fn write(&self, path: &Path) -> Result<(), DocumentError> {
        let bytes = self.to_bytes()?;
        let write_err = |source| DocumentError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
        }
        tokio::fs::write(path, bytes).await.map_err(write_err)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Users currently listed under `<users>`, in document order.
    pub fn users(&self) -> Vec<UserEntry> {
        self.section_elements(USERS_SECTION, USER_ELEMENT)
            .map(|user| UserEntry {
                name: attribute(user, "name"),
                password: attribute(user, "password"),
                resources: attribute(user, "resources"),
            })
            .collect()
    }

    /// Properties currently listed under `<properties>`, in document order.
    pub fn properties(&self) -> Vec<PropertyEntry> {
        self.section_elements(PROPERTIES_SECTION, ENTRY_ELEMENT)
            .map(|entry| PropertyEntry {
                name: attribute(entry, "name"),
                value: attribute(entry, "value"),
            })
            .collect()
    }

    /// Value of the property named `name` (exact match).
    pub fn property(&self, name: &str) -> Option<String> {
        self.properties()
            .into_iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }

    fn section_elements<'a>(
        &'a self,
        section: &'a str,
        element: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.root
            .get_child(section)
            .into_iter()
            .flat_map(|s| s.children.iter())
            .filter_map(XMLNode::as_element)
            .filter(move |e| e.name == element)
    }

    /// The first `<name>` section under the root, appended if absent.
    pub(crate) fn section_mut(&mut self, name: &str) -> &mut Element {
        if self.root.get_child(name).is_none() {
            self.root.children.push(XMLNode::Element(Element::new(name)));
        }
        self.root
            .get_mut_child(name)
            .expect("section exists after insertion")
    }
}

fn attribute(element: &Element, name: &str) -> String {
    element.attributes.get(name).cloned().unwrap_or_default()
}
