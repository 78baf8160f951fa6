// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document parsers and format dispatch.

pub mod properties;
pub mod yaml;

pub use properties::PropertiesParser;
pub use yaml::YamlParser;

use crate::domain::{DocumentFormat, FlatProperties, Result};
use crate::ports::ConfigParser;

/// Parses `content` with the parser for `format`.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::parse_document;
/// use nacos_binder::domain::DocumentFormat;
///
/// let props = parse_document("server:\n  port: 80", DocumentFormat::Yaml).unwrap();
/// assert_eq!(props.get("server.port"), Some("80"));
/// ```
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<FlatProperties> {
    match format {
        DocumentFormat::Yaml => YamlParser::new().parse(content),
        DocumentFormat::Properties => PropertiesParser::new().parse(content),
    }
}

/// Converts content of unknown format into flattened properties.
///
/// YAML is tried first; content that is not a YAML mapping is parsed as
/// properties. Blank content yields an empty map.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::to_properties;
///
/// let from_yaml = to_properties("db:\n  host: h").unwrap();
/// assert_eq!(from_yaml.get("db.host"), Some("h"));
///
/// let from_properties = to_properties("timeout=30\nretries=3").unwrap();
/// assert_eq!(from_properties.get("retries"), Some("3"));
/// ```
pub fn to_properties(content: &str) -> Result<FlatProperties> {
    if content.trim().is_empty() {
        return Ok(FlatProperties::new());
    }
    match YamlParser::new().parse(content) {
        Ok(props) => Ok(props),
        Err(err) => {
            tracing::debug!("Content is not a YAML mapping ({}), parsing as properties", err);
            PropertiesParser::new().parse(content)
        }
    }
}
