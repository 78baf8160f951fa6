// SPDX-License-Identifier: MIT OR Apache-2.0

//! Owner of the config client handle and its settings.
//!
//! A `ConfigManager` is built once at startup and shared by `Arc` with the binder
//! and the refresh coordinator.

use crate::domain::{ClientSettings, ConfigError, DocumentKey, FlatProperties, Result};
use crate::ports::ConfigClient;
use std::sync::Arc;
use std::time::Duration;

/// The config client together with its settings.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::MemoryConfigClient;
/// use nacos_binder::service::ConfigManager;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn main() -> nacos_binder::domain::Result<()> {
/// let manager = ConfigManager::builder()
///     .with_client(Arc::new(MemoryConfigClient::new()))
///     .with_group("OPS")
///     .with_timeout(Duration::from_secs(2))
///     .build()?;
///
/// assert_eq!(manager.settings().group, "OPS");
/// assert_eq!(manager.timeout(), Duration::from_secs(2));
/// # Ok(())
/// # }
/// ```
pub struct ConfigManager {
    client: Arc<dyn ConfigClient>,
    settings: ClientSettings,
}

impl ConfigManager {
    /// Creates a manager from a client and settings.
    pub fn new(client: Arc<dyn ConfigClient>, settings: ClientSettings) -> Self {
        ConfigManager { client, settings }
    }

    /// Creates a new manager builder.
    pub fn builder() -> ConfigManagerBuilder {
        ConfigManagerBuilder::new()
    }

    /// The config client.
    pub fn client(&self) -> &Arc<dyn ConfigClient> {
        &self.client
    }

    /// The client settings.
    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Bound on blocking fetches.
    pub fn timeout(&self) -> Duration {
        self.settings.timeout()
    }

    /// Builds the key of a declared document. An empty group means the default
    /// group of the settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidDeclaration` if `data_id` is blank.
    pub fn resolve_document(&self, data_id: &str, group: &str) -> Result<DocumentKey> {
        if data_id.trim().is_empty() {
            return Err(ConfigError::InvalidDeclaration {
                message: "dataId must not be empty".to_string(),
            });
        }
        let group = if group.trim().is_empty() {
            self.settings.group.as_str()
        } else {
            group
        };
        Ok(DocumentKey::new(data_id, group))
    }
}

/// Builder for constructing a `ConfigManager`.
///
/// Settings start from their defaults; later calls override earlier ones.
#[derive(Default)]
pub struct ConfigManagerBuilder {
    client: Option<Arc<dyn ConfigClient>>,
    settings: ClientSettings,
}

impl ConfigManagerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the config client.
    pub fn with_client(mut self, client: Arc<dyn ConfigClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Replaces all settings.
    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Reads settings from application properties under the resolved prefix.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nacos_binder::adapters::MemoryConfigClient;
    /// use nacos_binder::domain::FlatProperties;
    /// use nacos_binder::service::ConfigManager;
    /// use std::sync::Arc;
    ///
    /// # fn main() -> nacos_binder::domain::Result<()> {
    /// let props: FlatProperties = [("spring.nacos.config.group", "OPS")].into_iter().collect();
    /// let manager = ConfigManager::builder()
    ///     .with_client(Arc::new(MemoryConfigClient::new()))
    ///     .with_properties(&props)?
    ///     .build()?;
    /// assert_eq!(manager.settings().group, "OPS");
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_properties(mut self, properties: &FlatProperties) -> Result<Self> {
        self.settings = ClientSettings::from_properties(properties)?;
        Ok(self)
    }

    /// Sets the default group.
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.settings.group = group.into();
        self
    }

    /// Sets the fetch timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.settings.timeout = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enables or disables refreshing of remote property sources.
    pub fn with_refresh_enabled(mut self, enabled: bool) -> Self {
        self.settings.refresh_enabled = enabled;
        self
    }

    /// Builds the manager.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::SourceError` if no client was set.
    pub fn build(self) -> Result<ConfigManager> {
        let client = self.client.ok_or_else(|| ConfigError::SourceError {
            source_name: "config-manager".to_string(),
            message: "no config client configured".to_string(),
            source: None,
        })?;
        tracing::info!(
            "Config manager using client '{}' (server {}, namespace '{}', group {})",
            client.name(),
            self.settings.server_addr,
            self.settings.namespace,
            self.settings.group
        );
        Ok(ConfigManager::new(client, self.settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryConfigClient;
    use crate::domain::DEFAULT_GROUP;

    fn manager() -> ConfigManager {
        ConfigManager::builder()
            .with_client(Arc::new(MemoryConfigClient::new()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_build_requires_client() {
        assert!(matches!(
            ConfigManager::builder().build(),
            Err(ConfigError::SourceError { .. })
        ));
    }

    #[test]
    fn test_defaults() {
        let manager = manager();
        assert_eq!(manager.settings().group, DEFAULT_GROUP);
        assert_eq!(manager.timeout(), Duration::from_millis(5000));
        assert_eq!(manager.client().name(), "memory");
    }

    #[test]
    fn test_resolve_document_default_group() {
        let manager = ConfigManager::builder()
            .with_client(Arc::new(MemoryConfigClient::new()))
            .with_group("OPS")
            .build()
            .unwrap();
        let doc = manager.resolve_document("app.yaml", "").unwrap();
        assert_eq!(doc.group(), "OPS");
        let doc = manager.resolve_document("app.yaml", "DEV").unwrap();
        assert_eq!(doc.group(), "DEV");
    }

    #[test]
    fn test_resolve_document_requires_data_id() {
        assert!(matches!(
            manager().resolve_document(" ", "G"),
            Err(ConfigError::InvalidDeclaration { .. })
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let manager = ConfigManager::builder()
            .with_client(Arc::new(MemoryConfigClient::new()))
            .with_settings(ClientSettings {
                namespace: "dev".to_string(),
                ..ClientSettings::default()
            })
            .with_timeout(Duration::from_millis(250))
            .with_refresh_enabled(false)
            .build()
            .unwrap();
        assert_eq!(manager.settings().namespace, "dev");
        assert_eq!(manager.settings().timeout, 250);
        assert!(!manager.settings().refresh_enabled);
    }
}
