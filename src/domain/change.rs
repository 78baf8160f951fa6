// SPDX-License-Identifier: MIT OR Apache-2.0

//! Key-level change records produced by diffing two versions of a document.

use indexmap::IndexMap;
use std::fmt;

/// How a single key changed between two versions of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// The key exists only in the new version.
    Added,
    /// The key exists in both versions with different values.
    Modified,
    /// The key exists only in the old version.
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Added => "ADDED",
            ChangeKind::Modified => "MODIFIED",
            ChangeKind::Deleted => "DELETED",
        })
    }
}

/// The change of one key.
///
/// The constructors uphold the invariant that `Added` has only a new value,
/// `Deleted` has only an old value, and `Modified` has two different values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeItem {
    key: String,
    old_value: Option<String>,
    new_value: Option<String>,
    kind: ChangeKind,
}

impl ChangeItem {
    /// A key that appeared.
    pub fn added(key: impl Into<String>, new_value: impl Into<String>) -> Self {
        ChangeItem {
            key: key.into(),
            old_value: None,
            new_value: Some(new_value.into()),
            kind: ChangeKind::Added,
        }
    }

    /// A key whose value changed. Returns `None` if both values are equal.
    pub fn modified(
        key: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Option<Self> {
        let (old_value, new_value) = (old_value.into(), new_value.into());
        if old_value == new_value {
            return None;
        }
        Some(ChangeItem {
            key: key.into(),
            old_value: Some(old_value),
            new_value: Some(new_value),
            kind: ChangeKind::Modified,
        })
    }

    /// A key that disappeared.
    pub fn deleted(key: impl Into<String>, old_value: impl Into<String>) -> Self {
        ChangeItem {
            key: key.into(),
            old_value: Some(old_value.into()),
            new_value: None,
            kind: ChangeKind::Deleted,
        }
    }

    /// The dotted key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Value before the change.
    pub fn old_value(&self) -> Option<&str> {
        self.old_value.as_deref()
    }

    /// Value after the change.
    pub fn new_value(&self) -> Option<&str> {
        self.new_value.as_deref()
    }

    /// Kind of change.
    pub fn kind(&self) -> ChangeKind {
        self.kind
    }
}

/// All key changes of one content update, in a stable order.
///
/// Built once per update and immutable afterwards. Lookup by key is O(1).
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::{ChangeEvent, ChangeItem, ChangeKind};
///
/// let event: ChangeEvent = vec![ChangeItem::added("retries", "3")].into_iter().collect();
/// assert_eq!(event.len(), 1);
/// assert_eq!(event.item("retries").unwrap().kind(), ChangeKind::Added);
/// assert!(event.item("timeout").is_none());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeEvent {
    items: IndexMap<String, ChangeItem>,
}

impl ChangeEvent {
    /// Returns the change of `key`, if it changed.
    pub fn item(&self, key: &str) -> Option<&ChangeItem> {
        self.items.get(key)
    }

    /// Iterates over every change in order.
    pub fn items(&self) -> impl Iterator<Item = &ChangeItem> {
        self.items.values()
    }

    /// Returns `true` if `key` changed.
    pub fn contains_key(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    /// Number of changed keys.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ChangeItem> for ChangeEvent {
    fn from_iter<I: IntoIterator<Item = ChangeItem>>(iter: I) -> Self {
        ChangeEvent {
            items: iter
                .into_iter()
                .map(|item| (item.key.clone(), item))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_added_item() {
        let item = ChangeItem::added("a", "1");
        assert_eq!(item.kind(), ChangeKind::Added);
        assert_eq!(item.old_value(), None);
        assert_eq!(item.new_value(), Some("1"));
    }

    #[test]
    fn test_deleted_item() {
        let item = ChangeItem::deleted("a", "1");
        assert_eq!(item.kind(), ChangeKind::Deleted);
        assert_eq!(item.old_value(), Some("1"));
        assert_eq!(item.new_value(), None);
    }

    #[test]
    fn test_modified_item_requires_difference() {
        assert!(ChangeItem::modified("a", "1", "1").is_none());

        let item = ChangeItem::modified("a", "1", "2").unwrap();
        assert_eq!(item.kind(), ChangeKind::Modified);
        assert_eq!(item.old_value(), Some("1"));
        assert_eq!(item.new_value(), Some("2"));
    }

    #[test]
    fn test_event_preserves_order_and_lookup() {
        let event: ChangeEvent = vec![
            ChangeItem::added("z", "1"),
            ChangeItem::deleted("a", "2"),
        ]
        .into_iter()
        .collect();

        let keys: Vec<_> = event.items().map(ChangeItem::key).collect();
        assert_eq!(keys, vec!["z", "a"]);
        assert!(event.contains_key("a"));
        assert!(!event.is_empty());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ChangeKind::Added.to_string(), "ADDED");
        assert_eq!(ChangeKind::Modified.to_string(), "MODIFIED");
        assert_eq!(ChangeKind::Deleted.to_string(), "DELETED");
    }
}
