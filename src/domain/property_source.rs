// SPDX-License-Identifier: MIT OR Apache-2.0

//! Named property sources and the ordered environment that holds them.
//!
//! The environment is an ordered list of property sources. Lookups walk the list
//! front to back and the first source defining a key wins, so the position of a
//! source is its precedence. Remote sources (backed by a config-service document)
//! can be replaced in place when their document changes.

use crate::domain::document_key::DocumentKey;
use crate::domain::properties::{normalize_prefix, resolve_placeholders, FlatProperties};
use parking_lot::RwLock;
use std::sync::Arc;

/// Where the properties of a source came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceOrigin {
    /// Application-local source (defaults, files bundled with the app).
    Local,
    /// A config-service document.
    Remote {
        /// Whether pushes for the document should rebuild the source.
        refreshable: bool,
    },
}

/// A named set of properties.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertySource {
    name: String,
    origin: SourceOrigin,
    properties: FlatProperties,
}

impl PropertySource {
    /// Creates a local source.
    pub fn local(name: impl Into<String>, properties: FlatProperties) -> Self {
        PropertySource {
            name: name.into(),
            origin: SourceOrigin::Local,
            properties,
        }
    }

    /// Creates a remote source for `document`, named `data_id,group`.
    pub fn remote(document: &DocumentKey, refreshable: bool, properties: FlatProperties) -> Self {
        PropertySource {
            name: document.source_name(),
            origin: SourceOrigin::Remote { refreshable },
            properties,
        }
    }

    /// Source name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source origin.
    pub fn origin(&self) -> SourceOrigin {
        self.origin
    }

    /// `true` for config-service backed sources.
    pub fn is_remote(&self) -> bool {
        matches!(self.origin, SourceOrigin::Remote { .. })
    }

    /// `true` for remote sources that follow document changes.
    pub fn is_refreshable(&self) -> bool {
        matches!(self.origin, SourceOrigin::Remote { refreshable: true })
    }

    /// Looks up a single property.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// All properties of this source.
    pub fn properties(&self) -> &FlatProperties {
        &self.properties
    }
}

/// Ordered, thread-safe list of property sources.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::{Environment, FlatProperties, PropertySource};
///
/// let env = Environment::new();
/// env.add_last(PropertySource::local("defaults", [("a", "1")].into_iter().collect()));
/// env.add_first(PropertySource::local("overrides", [("a", "2")].into_iter().collect()));
///
/// assert_eq!(env.get_property("a").as_deref(), Some("2"));
/// assert_eq!(env.names(), vec!["overrides", "defaults"]);
/// ```
#[derive(Debug, Default)]
pub struct Environment {
    sources: RwLock<Vec<Arc<PropertySource>>>,
}

impl Environment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a source with the highest precedence, replacing any source with the
    /// same name.
    pub fn add_first(&self, source: PropertySource) {
        let mut sources = self.sources.write();
        sources.retain(|s| s.name() != source.name());
        sources.insert(0, Arc::new(source));
    }

    /// Adds a source with the lowest precedence, replacing any source with the
    /// same name.
    pub fn add_last(&self, source: PropertySource) {
        let mut sources = self.sources.write();
        sources.retain(|s| s.name() != source.name());
        sources.push(Arc::new(source));
    }

    /// Returns the source named `name`.
    pub fn get(&self, name: &str) -> Option<Arc<PropertySource>> {
        self.sources.read().iter().find(|s| s.name() == name).cloned()
    }

    /// Replaces the source named `name` at its current position.
    ///
    /// Returns the previous source, or `None` (and leaves the list untouched)
    /// if no source has that name.
    pub fn replace(&self, name: &str, source: PropertySource) -> Option<Arc<PropertySource>> {
        let mut sources = self.sources.write();
        let index = sources.iter().position(|s| s.name() == name)?;
        Some(std::mem::replace(&mut sources[index], Arc::new(source)))
    }

    /// Removes the source named `name`.
    pub fn remove(&self, name: &str) -> Option<Arc<PropertySource>> {
        let mut sources = self.sources.write();
        let index = sources.iter().position(|s| s.name() == name)?;
        Some(sources.remove(index))
    }

    /// Source names in precedence order.
    pub fn names(&self) -> Vec<String> {
        self.sources
            .read()
            .iter()
            .map(|s| s.name().to_string())
            .collect()
    }

    /// Snapshot of the sources in precedence order.
    pub fn sources(&self) -> Vec<Arc<PropertySource>> {
        self.sources.read().clone()
    }

    /// Resolves `key` against the sources; the first source defining it wins.
    pub fn get_property(&self, key: &str) -> Option<String> {
        self.sources
            .read()
            .iter()
            .find_map(|s| s.get(key).map(str::to_string))
    }

    /// Replaces `${...}` placeholders in `value` with properties of this
    /// environment. Unresolvable placeholders are kept.
    pub fn resolve_placeholders(&self, value: &str) -> String {
        let sources = self.sources();
        resolve_placeholders(value, |key| first_match(&sources, key))
    }

    /// Collects every property under `prefix` with the prefix stripped. When several
    /// sources define the same key, the one with the highest precedence wins.
    /// Placeholders in the values are resolved against the whole environment.
    pub fn sub_properties(&self, prefix: &str) -> FlatProperties {
        let normalized = normalize_prefix(prefix);
        let sources = self.sources();
        let mut result = FlatProperties::new();
        for source in &sources {
            for (key, value) in source.properties().iter() {
                if let Some(sub) = key.strip_prefix(normalized.as_str()) {
                    if !result.contains_key(sub) {
                        let value = resolve_placeholders(value, |name| first_match(&sources, name));
                        result.insert(sub, value);
                    }
                }
            }
        }
        result
    }
}

fn first_match(sources: &[Arc<PropertySource>], key: &str) -> Option<String> {
    sources.iter().find_map(|s| s.get(key).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> FlatProperties {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_remote_source_name() {
        let doc = DocumentKey::new("app.properties", "G");
        let source = PropertySource::remote(&doc, true, FlatProperties::new());
        assert_eq!(source.name(), "app.properties,G");
        assert!(source.is_remote());
        assert!(source.is_refreshable());
    }

    #[test]
    fn test_local_source_is_not_remote() {
        let source = PropertySource::local("defaults", FlatProperties::new());
        assert!(!source.is_remote());
        assert!(!source.is_refreshable());
        assert_eq!(source.origin(), SourceOrigin::Local);
    }

    #[test]
    fn test_replace_keeps_position() {
        let env = Environment::new();
        env.add_last(PropertySource::local("A", props(&[("k", "a")])));
        env.add_last(PropertySource::local("N", props(&[("k", "n")])));
        env.add_last(PropertySource::local("B", props(&[("k", "b")])));

        let previous = env.replace("N", PropertySource::local("N", props(&[("k", "n2")])));
        assert!(previous.is_some());
        assert_eq!(env.names(), vec!["A", "N", "B"]);
        assert_eq!(env.get("N").unwrap().get("k"), Some("n2"));
    }

    #[test]
    fn test_replace_missing_is_noop() {
        let env = Environment::new();
        env.add_last(PropertySource::local("A", FlatProperties::new()));
        assert!(env
            .replace("missing", PropertySource::local("missing", FlatProperties::new()))
            .is_none());
        assert_eq!(env.names(), vec!["A"]);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let env = Environment::new();
        env.add_last(PropertySource::local("A", props(&[("k", "1")])));
        env.add_first(PropertySource::local("A", props(&[("k", "2")])));
        assert_eq!(env.names(), vec!["A"]);
        assert_eq!(env.get_property("k").as_deref(), Some("2"));
    }

    #[test]
    fn test_first_source_wins() {
        let env = Environment::new();
        env.add_last(PropertySource::local("high", props(&[("k", "high")])));
        env.add_last(PropertySource::local("low", props(&[("k", "low"), ("only", "low")])));

        assert_eq!(env.get_property("k").as_deref(), Some("high"));
        assert_eq!(env.get_property("only").as_deref(), Some("low"));
        assert_eq!(env.get_property("missing"), None);
    }

    #[test]
    fn test_sub_properties_precedence() {
        let env = Environment::new();
        env.add_last(PropertySource::local(
            "high",
            props(&[("db.host", "primary")]),
        ));
        env.add_last(PropertySource::local(
            "low",
            props(&[("db.host", "fallback"), ("db.port", "5432")]),
        ));

        let sub = env.sub_properties("db");
        assert_eq!(sub.get("host"), Some("primary"));
        assert_eq!(sub.get("port"), Some("5432"));
    }

    #[test]
    fn test_sub_properties_resolves_placeholders_across_sources() {
        let env = Environment::new();
        env.add_last(PropertySource::local(
            "application",
            props(&[
                ("spring.nacos.config.server-addr", "${host}:8848"),
                ("spring.nacos.config.namespace", "${tenant}"),
            ]),
        ));
        env.add_last(PropertySource::local("hosts", props(&[("host", "10.0.0.1")])));
        env.add_last(PropertySource::local("stale", props(&[("host", "10.9.9.9")])));

        let sub = env.sub_properties("spring.nacos.config");
        assert_eq!(sub.get("server-addr"), Some("10.0.0.1:8848"));
        assert_eq!(sub.get("namespace"), Some("${tenant}"));
        assert_eq!(env.resolve_placeholders("${host:none}/x"), "10.0.0.1/x");
    }

    #[test]
    fn test_remove() {
        let env = Environment::new();
        env.add_last(PropertySource::local("A", FlatProperties::new()));
        assert!(env.remove("A").is_some());
        assert!(env.remove("A").is_none());
        assert!(env.names().is_empty());
    }
}
