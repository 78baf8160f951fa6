// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config client trait definition.
//!
//! This module defines the `ConfigClient` trait, the port through which the crate
//! talks to a config service: a blocking fetch of a document and a push channel that
//! delivers the full new content of a document each time it changes.

use crate::domain::{DocumentKey, Result};
use crate::ports::ConfigListener;
use std::sync::Arc;
use std::time::Duration;

/// A trait for config service clients.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`. Listener callbacks may run on any thread,
/// but implementations must not dispatch two updates of the same document to the
/// same listener concurrently, and must deliver updates in content order.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::ports::{ConfigClient, ConfigListener};
/// use nacos_binder::domain::{DocumentKey, Result};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct StaticClient;
///
/// impl ConfigClient for StaticClient {
///     fn name(&self) -> &str {
///         "static"
///     }
///
///     fn get_config(&self, _document: &DocumentKey, _timeout: Duration) -> Result<Option<String>> {
///         Ok(Some("timeout=30".to_string()))
///     }
///
///     fn add_listener(&self, _document: &DocumentKey, _listener: Arc<dyn ConfigListener>) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait ConfigClient: Send + Sync {
    /// Returns the name of this client, used in logs and errors.
    fn name(&self) -> &str;

    /// Fetches the current content of `document`, waiting at most `timeout`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(content))` - The document exists
    /// * `Ok(None)` - The document does not exist
    /// * `Err(ConfigError::ConfigFetchTimeout)` - The service did not answer in time
    /// * `Err(ConfigError)` - Any other client failure
    fn get_config(&self, document: &DocumentKey, timeout: Duration) -> Result<Option<String>>;

    /// Subscribes `listener` to changes of `document`.
    ///
    /// Every change delivers the complete new content, never a diff. Each call adds
    /// one subscription; callers are responsible for not subscribing twice.
    fn add_listener(&self, document: &DocumentKey, listener: Arc<dyn ConfigListener>)
        -> Result<()>;

    /// Convenience wrapper around [`ConfigClient::get_config`] taking the two key
    /// parts as strings.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use nacos_binder::ports::{ConfigClient, ConfigListener};
    /// # use nacos_binder::domain::{DocumentKey, Result};
    /// # use std::sync::Arc;
    /// # use std::time::Duration;
    /// # struct StaticClient;
    /// # impl ConfigClient for StaticClient {
    /// #     fn name(&self) -> &str { "static" }
    /// #     fn get_config(&self, _d: &DocumentKey, _t: Duration) -> Result<Option<String>> {
    /// #         Ok(Some("timeout=30".to_string()))
    /// #     }
    /// #     fn add_listener(&self, _d: &DocumentKey, _l: Arc<dyn ConfigListener>) -> Result<()> { Ok(()) }
    /// # }
    /// let client = StaticClient;
    /// let content = client
    ///     .get_config_str("app.properties", "DEFAULT_GROUP", Duration::from_secs(5))
    ///     .unwrap();
    /// assert_eq!(content.as_deref(), Some("timeout=30"));
    /// ```
    fn get_config_str(&self, data_id: &str, group: &str, timeout: Duration) -> Result<Option<String>> {
        self.get_config(&DocumentKey::new(data_id, group), timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    // Test implementation of ConfigClient for testing purposes
    #[derive(Default)]
    struct TestClient {
        listeners: Mutex<Vec<(DocumentKey, Arc<dyn ConfigListener>)>>,
    }

    impl ConfigClient for TestClient {
        fn name(&self) -> &str {
            "test-client"
        }

        fn get_config(&self, document: &DocumentKey, _timeout: Duration) -> Result<Option<String>> {
            Ok(Some(format!("source={}", document.data_id())))
        }

        fn add_listener(
            &self,
            document: &DocumentKey,
            listener: Arc<dyn ConfigListener>,
        ) -> Result<()> {
            self.listeners.lock().push((document.clone(), listener));
            Ok(())
        }
    }

    struct NoopListener;

    impl ConfigListener for NoopListener {
        fn receive_config_info(&self, _content: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_client_name() {
        assert_eq!(TestClient::default().name(), "test-client");
    }

    #[test]
    fn test_get_config_str_uses_default_group() {
        let client = TestClient::default();
        let content = client
            .get_config_str("a.properties", "", Duration::from_millis(10))
            .unwrap();
        assert_eq!(content.as_deref(), Some("source=a.properties"));
    }

    #[test]
    fn test_add_listener() {
        let client = TestClient::default();
        client
            .add_listener(&DocumentKey::new("a", "G"), Arc::new(NoopListener))
            .unwrap();
        assert_eq!(client.listeners.lock().len(), 1);
    }

    #[test]
    fn test_config_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ConfigClient>();
    }
}
