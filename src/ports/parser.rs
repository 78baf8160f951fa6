// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which provides an interface for
//! parsing raw document content in one format (YAML, properties) into flattened
//! properties.

use crate::domain::{DocumentFormat, FlatProperties, Result};

/// A trait for parsing configuration documents.
///
/// # Key Format
///
/// Parsers flatten nested structures using dot notation. For example, a YAML
/// structure like:
///
/// ```yaml
/// database:
///   host: localhost
///   port: 5432
/// ```
///
/// is parsed into:
/// - `database.host` -> `"localhost"`
/// - `database.port` -> `"5432"`
///
/// Keys appear in document order.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::ports::ConfigParser;
/// use nacos_binder::domain::{DocumentFormat, FlatProperties, Result};
///
/// struct CsvPairs;
///
/// impl ConfigParser for CsvPairs {
///     fn parse(&self, content: &str) -> Result<FlatProperties> {
///         Ok(content
///             .split(',')
///             .filter_map(|pair| pair.split_once(':'))
///             .collect())
///     }
///
///     fn format(&self) -> DocumentFormat {
///         DocumentFormat::Properties
///     }
/// }
///
/// let props = CsvPairs.parse("a:1,b:2").unwrap();
/// assert_eq!(props.get("b"), Some("2"));
/// ```
pub trait ConfigParser: Send + Sync {
    /// Parses raw content into flattened properties.
    ///
    /// # Returns
    ///
    /// * `Ok(FlatProperties)` - The parsed document
    /// * `Err(ConfigError::ParseError)` - The content is malformed
    fn parse(&self, content: &str) -> Result<FlatProperties>;

    /// The document format this parser understands.
    fn format(&self) -> DocumentFormat;
}
