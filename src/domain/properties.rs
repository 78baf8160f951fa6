// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flattened, ordered key/value view of a configuration document.

use indexmap::IndexMap;
use std::fmt;

/// Ordered mapping from dotted key to string value.
///
/// Insertion order follows the traversal order of the parsed document, so two
/// parses of the same content always produce the same sequence of keys. Setting a
/// key that already exists keeps its original position.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::FlatProperties;
///
/// let mut props = FlatProperties::new();
/// props.insert("server.port", "8080");
/// props.insert("server.host", "localhost");
///
/// assert_eq!(props.get("server.port"), Some("8080"));
/// assert_eq!(props.keys().collect::<Vec<_>>(), vec!["server.port", "server.host"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatProperties {
    entries: IndexMap<String, String>,
}

impl FlatProperties {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates over the keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over `(key, value)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries whose key starts with `prefix.`, with the prefix
    /// stripped. A trailing `.` on `prefix` is accepted. `${...}` placeholders in
    /// the values are resolved against the whole map.
    ///
    /// # Examples
    ///
    /// ```
    /// use nacos_binder::domain::FlatProperties;
    ///
    /// let props: FlatProperties = [("db.host", "h"), ("db.port", "1"), ("dbx", "2")]
    ///     .into_iter()
    ///     .collect();
    /// let sub = props.sub_properties("db");
    /// assert_eq!(sub.get("host"), Some("h"));
    /// assert_eq!(sub.len(), 2);
    /// ```
    pub fn sub_properties(&self, prefix: &str) -> FlatProperties {
        let normalized = normalize_prefix(prefix);
        let lookup = |key: &str| self.get(key).map(str::to_string);
        self.iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(normalized.as_str())
                    .map(|sub| (sub, resolve_placeholders(v, &lookup)))
            })
            .collect()
    }
}

/// Placeholders nested deeper than this are left unresolved.
const MAX_PLACEHOLDER_DEPTH: usize = 16;

/// Replaces `${key}` and `${key:default}` placeholders in `value`.
///
/// Resolved values are themselves resolved, so placeholders may chain. A
/// placeholder whose key `lookup` cannot find and that has no default is kept
/// verbatim, as is an unterminated `${`.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::properties::resolve_placeholders;
///
/// let lookup = |key: &str| (key == "host").then(|| "10.0.0.1".to_string());
/// assert_eq!(resolve_placeholders("${host}:8848", lookup), "10.0.0.1:8848");
/// assert_eq!(resolve_placeholders("${port:8848}", lookup), "8848");
/// assert_eq!(resolve_placeholders("${missing}", lookup), "${missing}");
/// ```
pub fn resolve_placeholders<F>(value: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    resolve_nested(value, &lookup, 0)
}

fn resolve_nested(value: &str, lookup: &dyn Fn(&str) -> Option<String>, depth: usize) -> String {
    if depth >= MAX_PLACEHOLDER_DEPTH || !value.contains("${") {
        return value.to_string();
    }

    let mut resolved = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(start) = rest.find("${") {
        resolved.push_str(&rest[..start]);
        let body = &rest[start + 2..];
        let Some(end) = closing_brace(body) else {
            resolved.push_str(&rest[start..]);
            return resolved;
        };

        let expression = resolve_nested(&body[..end], lookup, depth + 1);
        let (key, default) = match expression.split_once(':') {
            Some((key, default)) => (key, Some(default)),
            None => (expression.as_str(), None),
        };
        match lookup(key).or_else(|| default.map(str::to_string)) {
            Some(found) => resolved.push_str(&resolve_nested(&found, lookup, depth + 1)),
            None => resolved.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &body[end + 1..];
    }
    resolved.push_str(rest);
    resolved
}

/// Byte offset of the `}` closing a placeholder body, skipping nested ones.
fn closing_brace(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut open = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                open += 1;
                i += 1;
            }
            b'}' if open == 0 => return Some(i),
            b'}' => open -= 1,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Appends a `.` to `prefix` unless it already ends with one.
pub fn normalize_prefix(prefix: &str) -> String {
    if prefix.ends_with('.') {
        prefix.to_string()
    } else {
        format!("{}.", prefix)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FlatProperties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = FlatProperties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl IntoIterator for FlatProperties {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl fmt::Display for FlatProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (k, v) in self.iter() {
            writeln!(f, "{}={}", k, v)?;
        }
        Ok(())
    }
}
