// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-level diff of two document versions.

use crate::adapters::parse_document;
use crate::domain::{ChangeEvent, ChangeItem, DocumentFormat, FlatProperties, Result};

/// Computes the key-level changes between two versions of a document.
///
/// Values are compared as strings; `"1"` and `"1.0"` are different values.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::domain::{ChangeKind, DocumentFormat};
/// use nacos_binder::service::ContentDiffer;
///
/// let event = ContentDiffer::diff(
///     Some("timeout=60"),
///     "timeout=60\nretries=3",
///     DocumentFormat::Properties,
/// )
/// .unwrap();
///
/// assert_eq!(event.len(), 1);
/// assert_eq!(event.item("retries").unwrap().kind(), ChangeKind::Added);
/// assert!(event.item("timeout").is_none());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDiffer;

impl ContentDiffer {
    /// Parses both versions with the parser for `format` and diffs them.
    ///
    /// An absent old version is treated as an empty document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if either version is malformed.
    pub fn diff(old: Option<&str>, new: &str, format: DocumentFormat) -> Result<ChangeEvent> {
        let old = match old {
            Some(content) => parse_document(content, format)?,
            None => FlatProperties::new(),
        };
        let new = parse_document(new, format)?;
        Ok(Self::diff_properties(&old, &new))
    }

    /// Diffs two already parsed versions.
    ///
    /// Items follow the key order of `new`; keys that only exist in `old` come
    /// last, in the order of `old`.
    pub fn diff_properties(old: &FlatProperties, new: &FlatProperties) -> ChangeEvent {
        let changed = new.iter().filter_map(|(key, new_value)| match old.get(key) {
            None => Some(ChangeItem::added(key, new_value)),
            Some(old_value) => ChangeItem::modified(key, old_value, new_value),
        });
        let deleted = old
            .iter()
            .filter(|(key, _)| !new.contains_key(key))
            .map(|(key, old_value)| ChangeItem::deleted(key, old_value));

        changed.chain(deleted).collect()
    }
}
