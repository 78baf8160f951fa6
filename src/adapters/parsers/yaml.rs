// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML document parser.

use crate::domain::{ConfigError, DocumentFormat, FlatProperties, Result};
use crate::ports::ConfigParser;

/// YAML parser implementation.
///
/// This parser converts YAML documents into flat key-value maps using dot notation
/// for nested structures. Sequence elements are keyed as `list[i]` and `null` becomes
/// an empty string. The document root must be a mapping; an empty document yields
/// no properties.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::YamlParser;
/// use nacos_binder::ports::ConfigParser;
///
/// let parser = YamlParser::new();
/// let yaml_content = "database:\n  host: localhost\n  port: 5432";
/// let result = parser.parse(yaml_content).unwrap();
/// assert_eq!(result.get("database.host"), Some("localhost"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }

    /// Flattens a YAML value into `result` with dot notation keys.
    fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, result: &mut FlatProperties) {
        match value {
            serde_yaml::Value::Mapping(map) => {
                for (key, val) in map {
                    if let Some(key_str) = Self::scalar_key(key) {
                        let new_prefix = if prefix.is_empty() {
                            key_str
                        } else {
                            format!("{}.{}", prefix, key_str)
                        };
                        Self::flatten_yaml(val, &new_prefix, result);
                    }
                }
            }
            serde_yaml::Value::Sequence(seq) => {
                for (i, val) in seq.iter().enumerate() {
                    let new_prefix = format!("{}[{}]", prefix, i);
                    Self::flatten_yaml(val, &new_prefix, result);
                }
            }
            serde_yaml::Value::String(s) => {
                result.insert(prefix, s.as_str());
            }
            serde_yaml::Value::Number(n) => {
                result.insert(prefix, n.to_string());
            }
            serde_yaml::Value::Bool(b) => {
                result.insert(prefix, b.to_string());
            }
            serde_yaml::Value::Null => {
                result.insert(prefix, "");
            }
            serde_yaml::Value::Tagged(tagged) => {
                Self::flatten_yaml(&tagged.value, prefix, result);
            }
        }
    }

    // Non-string scalar keys (`8080: x`, `true: y`) are kept in their literal form.
    fn scalar_key(key: &serde_yaml::Value) -> Option<String> {
        match key {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl ConfigParser for YamlParser {
    fn parse(&self, content: &str) -> Result<FlatProperties> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(ConfigError::from_yaml_error)?;

        let mut result = FlatProperties::new();
        match &value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(_) => Self::flatten_yaml(&value, "", &mut result),
            _ => {
                return Err(ConfigError::ParseError {
                    message: "YAML document root must be a mapping".to_string(),
                    source: None,
                })
            }
        }
        Ok(result)
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Yaml
    }
}
