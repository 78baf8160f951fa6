// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process config client.
//!
//! Documents live in memory and [`MemoryConfigClient::publish_config`] plays the
//! role of the server-side push: it stores the new content and hands it to every
//! listener of the document, in subscription order, on the caller's thread.

use crate::domain::{ConfigError, DocumentKey, Result};
use crate::ports::{ConfigClient, ConfigListener};
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Per-document state. `dispatch` serializes pushes so that listeners see
/// updates one at a time and in publish order.
#[derive(Default)]
struct DocumentChannel {
    content: RwLock<Option<String>>,
    listeners: RwLock<Vec<Arc<dyn ConfigListener>>>,
    dispatch: Mutex<()>,
}

/// A config client backed by process memory.
///
/// Useful for embedding and for tests: it counts fetches and subscriptions so
/// callers can assert on how the binder used it.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::MemoryConfigClient;
/// use nacos_binder::domain::DocumentKey;
/// use nacos_binder::ports::ConfigClient;
/// use std::time::Duration;
///
/// let client = MemoryConfigClient::new();
/// client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=30").unwrap();
///
/// let key = DocumentKey::new("app.properties", "DEFAULT_GROUP");
/// let content = client.get_config(&key, Duration::from_secs(1)).unwrap();
/// assert_eq!(content.as_deref(), Some("timeout=30"));
/// ```
pub struct MemoryConfigClient {
    name: String,
    documents: DashMap<DocumentKey, Arc<DocumentChannel>>,
    fetch_delay: RwLock<Option<Duration>>,
    fetches: AtomicUsize,
    subscriptions: AtomicUsize,
}

impl MemoryConfigClient {
    /// Creates an empty client named `memory`.
    pub fn new() -> Self {
        Self::with_name("memory")
    }

    /// Creates an empty client with a custom name.
    pub fn with_name(name: impl Into<String>) -> Self {
        MemoryConfigClient {
            name: name.into(),
            documents: DashMap::new(),
            fetch_delay: RwLock::new(None),
            fetches: AtomicUsize::new(0),
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Simulates a slow server: every fetch takes `delay`. A fetch whose timeout
    /// is shorter than the delay fails with `ConfigFetchTimeout` once the timeout
    /// has elapsed.
    pub fn set_fetch_delay(&self, delay: Option<Duration>) {
        *self.fetch_delay.write() = delay;
    }

    fn channel(&self, document: &DocumentKey) -> Arc<DocumentChannel> {
        self.documents
            .entry(document.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Stores new content for the document and pushes it to its listeners.
    ///
    /// Every listener is notified even if an earlier one fails. Failures are
    /// logged and reported as a single `SourceError` wrapping the first failure.
    pub fn publish_config(&self, data_id: &str, group: &str, content: &str) -> Result<()> {
        let document = DocumentKey::new(data_id, group);
        let channel = self.channel(&document);

        let _dispatch = channel.dispatch.lock();
        *channel.content.write() = Some(content.to_string());
        tracing::debug!("Published {} ({} bytes)", document, content.len());

        self.dispatch(&document, &channel, content)
    }

    /// Removes the document. Listeners receive empty content.
    pub fn remove_config(&self, data_id: &str, group: &str) -> Result<()> {
        let document = DocumentKey::new(data_id, group);
        let Some(channel) = self.documents.get(&document).map(|c| c.value().clone()) else {
            return Ok(());
        };

        let _dispatch = channel.dispatch.lock();
        if channel.content.write().take().is_none() {
            return Ok(());
        }
        tracing::debug!("Removed {}", document);

        self.dispatch(&document, &channel, "")
    }

    fn dispatch(&self, document: &DocumentKey, channel: &DocumentChannel, content: &str) -> Result<()> {
        let listeners = channel.listeners.read().clone();
        let mut failures = Vec::new();

        for listener in &listeners {
            if let Err(e) = listener.receive_config_info(content) {
                tracing::warn!(
                    "Listener {} failed to handle {}: {}",
                    listener.describe(),
                    document,
                    e
                );
                failures.push(e);
            }
        }

        let failed = failures.len();
        match failures.into_iter().next() {
            None => Ok(()),
            Some(first) => Err(ConfigError::SourceError {
                source_name: self.name.clone(),
                message: format!(
                    "{} of {} listener(s) failed for {}",
                    failed,
                    listeners.len(),
                    document
                ),
                source: Some(Box::new(first)),
            }),
        }
    }

    /// Number of `get_config` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Number of `add_listener` calls served so far, across all documents.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }

    /// Number of listeners subscribed to `document`.
    pub fn listener_count(&self, document: &DocumentKey) -> usize {
        self.documents
            .get(document)
            .map(|c| c.listeners.read().len())
            .unwrap_or(0)
    }
}

impl Default for MemoryConfigClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigClient for MemoryConfigClient {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_config(&self, document: &DocumentKey, timeout: Duration) -> Result<Option<String>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let delay = *self.fetch_delay.read();
        if let Some(delay) = delay {
            if delay > timeout {
                std::thread::sleep(timeout);
                return Err(ConfigError::ConfigFetchTimeout {
                    data_id: document.data_id().to_string(),
                    group: document.group().to_string(),
                    timeout,
                });
            }
            std::thread::sleep(delay);
        }

        Ok(self
            .documents
            .get(document)
            .and_then(|c| c.content.read().clone()))
    }

    fn add_listener(&self, document: &DocumentKey, listener: Arc<dyn ConfigListener>) -> Result<()> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("Subscribed {} to {}", listener.describe(), document);
        self.channel(document).listeners.write().push(listener);
        Ok(())
    }
}
