// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use nacos_binder::adapters::MemoryConfigClient;
use nacos_binder::domain::{ChangeEvent, ChangeKind, DocumentKey, Result};
use nacos_binder::ports::{ConfigClient, ConfigListener, ContextRefresher};
use nacos_binder::service::{ConfigBinder, ConfigManager};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Duration;

pub const DATA_ID: &str = "app.properties";
pub const GROUP: &str = "DEFAULT_GROUP";

/// Installs a test subscriber once so `tracing` output shows up in failures.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Bean used across the binding tests.
#[derive(Debug, Default)]
pub struct Server {
    pub timeout: i32,
    pub retries: i64,
    pub host: String,
    pub calls: Vec<String>,
    pub changes: Vec<Vec<(String, ChangeKind)>>,
}

impl Server {
    pub fn record(&mut self, event: &ChangeEvent) {
        self.changes
            .push(event.items().map(|i| (i.key().to_string(), i.kind())).collect());
    }
}

pub fn server() -> Arc<RwLock<Server>> {
    Arc::new(RwLock::new(Server::default()))
}

/// Config client that records every subscription before delegating.
pub struct CountingClient {
    inner: Arc<MemoryConfigClient>,
    subscriptions: Mutex<Vec<(DocumentKey, String)>>,
}

impl CountingClient {
    pub fn new(inner: Arc<MemoryConfigClient>) -> Self {
        CountingClient {
            inner,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    /// Number of `add_listener` calls whose listener description contains `needle`.
    pub fn subscriptions_of(&self, needle: &str) -> usize {
        self.subscriptions
            .lock()
            .iter()
            .filter(|(_, description)| description.contains(needle))
            .count()
    }

    pub fn total_subscriptions(&self) -> usize {
        self.subscriptions.lock().len()
    }
}

impl ConfigClient for CountingClient {
    fn name(&self) -> &str {
        "counting"
    }

    fn get_config(&self, document: &DocumentKey, timeout: Duration) -> Result<Option<String>> {
        self.inner.get_config(document, timeout)
    }

    fn add_listener(&self, document: &DocumentKey, listener: Arc<dyn ConfigListener>) -> Result<()> {
        self.subscriptions
            .lock()
            .push((document.clone(), listener.describe()));
        self.inner.add_listener(document, listener)
    }
}

/// Records every refresh request.
#[derive(Default)]
pub struct RecordingRefresher {
    reasons: Mutex<Vec<String>>,
}

impl RecordingRefresher {
    pub fn reasons(&self) -> Vec<String> {
        self.reasons.lock().clone()
    }
}

impl ContextRefresher for RecordingRefresher {
    fn refresh(&self, reason: &str) {
        self.reasons.lock().push(reason.to_string());
    }
}

pub fn manager(client: Arc<dyn ConfigClient>) -> Arc<ConfigManager> {
    Arc::new(
        ConfigManager::builder()
            .with_client(client)
            .build()
            .expect("manager with a client"),
    )
}

pub fn binder(client: Arc<dyn ConfigClient>) -> ConfigBinder {
    ConfigBinder::new(manager(client))
}
