// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document identity and format.
//!
//! A configuration document on the config service is addressed by a two-part key:
//! its data id (the document name) and its group. This module provides the
//! `DocumentKey` type for that pair and `DocumentFormat`, which is derived from the
//! data id's extension.

use std::fmt;

/// Group used when a binding or request does not name one.
pub const DEFAULT_GROUP: &str = "DEFAULT_GROUP";

/// Separator between data id and group in property-source names.
pub const SOURCE_NAME_SEPARATOR: &str = ",";

/// Textual format of a configuration document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// `key=value` lines.
    Properties,
    /// Nested YAML, flattened with `.`-joined keys.
    Yaml,
}

impl DocumentFormat {
    /// Derives the format from a data id: `.yml` and `.yaml` are YAML, anything
    /// else is treated as properties.
    ///
    /// # Examples
    ///
    /// ```
    /// use nacos_binder::domain::{DocumentFormat};
    ///
    /// assert_eq!(DocumentFormat::from_data_id("app.yaml"), DocumentFormat::Yaml);
    /// assert_eq!(DocumentFormat::from_data_id("app.properties"), DocumentFormat::Properties);
    /// ```
    pub fn from_data_id(data_id: &str) -> Self {
        if data_id.ends_with(".yml") || data_id.ends_with(".yaml") {
            DocumentFormat::Yaml
        } else {
            DocumentFormat::Properties
        }
    }

    /// Returns the lowercase name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Properties => "properties",
            DocumentFormat::Yaml => "yaml",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a configuration document: `(data_id, group)`.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::DocumentKey;
///
/// let key = DocumentKey::new("app.properties", "DEFAULT_GROUP");
/// assert_eq!(key.data_id(), "app.properties");
/// assert_eq!(key.source_name(), "app.properties,DEFAULT_GROUP");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    data_id: String,
    group: String,
}

impl DocumentKey {
    /// Creates a new key. An empty group is replaced by [`DEFAULT_GROUP`].
    pub fn new(data_id: impl Into<String>, group: impl Into<String>) -> Self {
        let group = group.into();
        DocumentKey {
            data_id: data_id.into(),
            group: if group.is_empty() {
                DEFAULT_GROUP.to_string()
            } else {
                group
            },
        }
    }

    /// Returns the data id.
    pub fn data_id(&self) -> &str {
        &self.data_id
    }

    /// Returns the group.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the document format derived from the data id.
    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_data_id(&self.data_id)
    }

    /// Returns the name under which this document is registered as a property
    /// source: `data_id + "," + group`.
    pub fn source_name(&self) -> String {
        format!("{}{}{}", self.data_id, SOURCE_NAME_SEPARATOR, self.group)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dataId={}, group={}", self.data_id, self.group)
    }
}
