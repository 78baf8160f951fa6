// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-document content cache shared by all bindings.
//!
//! The first request for a document fetches it with the configured timeout and
//! subscribes one listener that keeps the cached copy current. Later requests are
//! served from memory. Entries live as long as the cache.

use crate::domain::{DocumentKey, Result};
use crate::ports::{ConfigClient, ConfigListener};
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct CachedDocument {
    // Set once the fetch and the subscription both succeeded.
    initialized: OnceCell<()>,
    content: RwLock<Option<String>>,
}

/// Keeps a cache entry in sync with the push channel.
struct CacheRefresher {
    document: DocumentKey,
    entry: Arc<CachedDocument>,
}

impl ConfigListener for CacheRefresher {
    fn receive_config_info(&self, content: &str) -> Result<()> {
        *self.entry.content.write() = Some(content.to_string());
        tracing::debug!("Refreshed cached content of {}", self.document);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("content cache of {}", self.document)
    }
}

/// Cache of the last seen content per `(dataId, group)`.
///
/// Concurrent first requests for the same document block on a per-document lock
/// so the document is fetched and subscribed exactly once. A failed fetch leaves
/// the entry uninitialized and the next request retries.
pub struct CachedContent {
    client: Arc<dyn ConfigClient>,
    timeout: Duration,
    entries: DashMap<DocumentKey, Arc<CachedDocument>>,
}

impl CachedContent {
    /// Creates an empty cache in front of `client`.
    pub fn new(client: Arc<dyn ConfigClient>, timeout: Duration) -> Self {
        CachedContent {
            client,
            timeout,
            entries: DashMap::new(),
        }
    }

    /// Returns the current content of `document`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// Returns the client's error (typically `ConfigFetchTimeout`) if the first
    /// fetch or the subscription fails.
    pub fn get(&self, document: &DocumentKey) -> Result<Option<String>> {
        let entry = Arc::clone(self.entries.entry(document.clone()).or_default().value());

        entry.initialized.get_or_try_init(|| {
            let content = self.client.get_config(document, self.timeout)?;
            tracing::debug!(
                "Fetched {} from {} ({})",
                document,
                self.client.name(),
                if content.is_some() { "present" } else { "absent" }
            );
            *entry.content.write() = content;

            self.client.add_listener(
                document,
                Arc::new(CacheRefresher {
                    document: document.clone(),
                    entry: Arc::clone(&entry),
                }),
            )
        })?;

        let content = entry.content.read().clone();
        Ok(content)
    }

    /// Returns the cached content without fetching.
    pub fn peek(&self, document: &DocumentKey) -> Option<String> {
        self.entries
            .get(document)
            .filter(|entry| entry.initialized.get().is_some())
            .and_then(|entry| entry.content.read().clone())
    }

    /// Number of cached documents.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.initialized.get().is_some())
            .count()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
