// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client settings shared by the binder and the refresh coordinator.

use crate::domain::document_key::DEFAULT_GROUP;
use crate::domain::errors::{ConfigError, Result};
use crate::domain::properties::FlatProperties;
use crate::domain::value::{parse_primitive, PrimitiveValue};
use serde::Deserialize;
use std::time::Duration;

/// Default prefix of the client's own property keys.
pub const DEFAULT_PROPERTIES_PREFIX: &str = "spring.nacos";

/// Key that overrides [`DEFAULT_PROPERTIES_PREFIX`].
pub const PREFIX_OVERRIDE_KEY: &str = "spring.nacos.properties.prefix";

/// Default bound on a blocking config fetch.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Settings of the config client connection.
///
/// Deserializable from YAML (kebab-case keys) with every field optional.
///
/// # Examples
///
/// ```
/// use nacos_binder::domain::ClientSettings;
///
/// let settings = ClientSettings::from_yaml_str("server-addr: 10.0.0.1:8848\ntimeout: 3000").unwrap();
/// assert_eq!(settings.server_addr, "10.0.0.1:8848");
/// assert_eq!(settings.timeout().as_millis(), 3000);
/// assert_eq!(settings.group, "DEFAULT_GROUP");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientSettings {
    /// Address of the config service.
    pub server_addr: String,
    /// Namespace (tenant) of the documents.
    pub namespace: String,
    /// Group used when a binding names none.
    pub group: String,
    /// Fetch timeout in milliseconds.
    pub timeout: u64,
    /// Whether remote property sources follow document changes.
    pub refresh_enabled: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            server_addr: "127.0.0.1:8848".to_string(),
            namespace: String::new(),
            group: DEFAULT_GROUP.to_string(),
            timeout: DEFAULT_TIMEOUT_MS,
            refresh_enabled: true,
        }
    }
}

impl ClientSettings {
    /// Fetch timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    /// Parses settings from a YAML document.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(ConfigError::from_yaml_error)
    }

    /// Reads settings from flattened properties under `<prefix>.config.`, where the
    /// prefix is resolved with [`resolve_prefix`]. Missing keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use nacos_binder::domain::{ClientSettings, FlatProperties};
    ///
    /// let props: FlatProperties = [
    ///     ("spring.nacos.config.group", "OPS"),
    ///     ("spring.nacos.config.refresh-enabled", "false"),
    /// ]
    /// .into_iter()
    /// .collect();
    ///
    /// let settings = ClientSettings::from_properties(&props).unwrap();
    /// assert_eq!(settings.group, "OPS");
    /// assert!(!settings.refresh_enabled);
    /// ```
    pub fn from_properties(properties: &FlatProperties) -> Result<Self> {
        let prefix = resolve_prefix(properties);
        let config = properties.sub_properties(&format!("{}.config", prefix));
        let mut settings = ClientSettings::default();

        if let Some(addr) = config.get("server-addr") {
            settings.server_addr = addr.to_string();
        }
        if let Some(namespace) = config.get("namespace") {
            settings.namespace = namespace.to_string();
        }
        if let Some(group) = config.get("group").filter(|g| !g.trim().is_empty()) {
            settings.group = group.to_string();
        }
        if let Some(raw) = config.get("timeout") {
            if let PrimitiveValue::Long(ms) = parse_primitive("i64", raw)? {
                settings.timeout = u64::try_from(ms).map_err(|e| ConfigError::ParseError {
                    message: format!("timeout must not be negative: {}", ms),
                    source: Some(Box::new(e)),
                })?;
            }
        }
        if let Some(raw) = config.get("refresh-enabled") {
            if let PrimitiveValue::Boolean(enabled) = parse_primitive("bool", raw)? {
                settings.refresh_enabled = enabled;
            }
        }
        Ok(settings)
    }
}

/// Resolves the prefix of the client's own keys: the value of
/// [`PREFIX_OVERRIDE_KEY`] when it is not blank, [`DEFAULT_PROPERTIES_PREFIX`]
/// otherwise. A trailing `.` is removed.
pub fn resolve_prefix(properties: &FlatProperties) -> String {
    let prefix = properties
        .get(PREFIX_OVERRIDE_KEY)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(DEFAULT_PROPERTIES_PREFIX);
    prefix.strip_suffix('.').unwrap_or(prefix).to_string()
}
