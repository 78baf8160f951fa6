// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rebuilding of remote property sources when their documents change.
//!
//! The coordinator ignores refresh events until the application is ready. After
//! that, an event for `(dataId, group)` rebuilds the remote source named
//! `dataId,group` from the config client, swaps it in at the same position and
//! asks the [`ContextRefresher`] to refresh dependent state.

use crate::adapters::parse_document;
use crate::domain::document_key::SOURCE_NAME_SEPARATOR;
use crate::domain::{DocumentKey, Environment, FlatProperties, PropertySource, Result};
use crate::ports::{ConfigListener, ContextRefresher};
use crate::service::manager::ConfigManager;
use dashmap::DashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A document changed and its property source may need rebuilding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshEvent {
    data_id: String,
    group: String,
    description: String,
}

impl RefreshEvent {
    /// Creates an event for `(data_id, group)`.
    pub fn new(
        data_id: impl Into<String>,
        group: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        RefreshEvent {
            data_id: data_id.into(),
            group: group.into(),
            description: description.into(),
        }
    }

    /// Data id of the changed document.
    pub fn data_id(&self) -> &str {
        &self.data_id
    }

    /// Group of the changed document.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Why the event was raised.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Key of the changed document.
    pub fn document(&self) -> DocumentKey {
        DocumentKey::new(self.data_id.as_str(), self.group.as_str())
    }
}

/// What [`PropertySourceRefreshCoordinator::on_refresh_event`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The application was not ready yet.
    Dropped,
    /// No remote source with the document's name exists.
    NotManaged,
    /// The source was rebuilt and replaced.
    Replaced,
}

/// Builds remote property sources from the config client.
pub struct PropertySourceBuilder {
    manager: Arc<ConfigManager>,
}

impl PropertySourceBuilder {
    /// Creates a builder fetching through `manager`.
    pub fn new(manager: Arc<ConfigManager>) -> Self {
        PropertySourceBuilder { manager }
    }

    /// Fetches `document` and parses it by its format. A missing document yields
    /// an empty source.
    ///
    /// # Errors
    ///
    /// Returns the client's error if the fetch fails, or `ParseError` if the
    /// content is malformed.
    pub fn build(&self, document: &DocumentKey, refreshable: bool) -> Result<PropertySource> {
        let content = self
            .manager
            .client()
            .get_config(document, self.manager.timeout())?;
        let properties = match content {
            Some(content) => parse_document(&content, document.format())?,
            None => FlatProperties::new(),
        };
        tracing::debug!(
            "Built property source {} with {} properties",
            document.source_name(),
            properties.len()
        );
        Ok(PropertySource::remote(document, refreshable, properties))
    }
}

/// Swaps rebuilt remote property sources into the environment.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::MemoryConfigClient;
/// use nacos_binder::domain::{DocumentKey, Environment, FlatProperties, PropertySource};
/// use nacos_binder::ports::LoggingRefresher;
/// use nacos_binder::service::{ConfigManager, PropertySourceRefreshCoordinator, RefreshEvent, RefreshOutcome};
/// use std::sync::Arc;
///
/// # fn main() -> nacos_binder::domain::Result<()> {
/// let client = Arc::new(MemoryConfigClient::new());
/// let manager = Arc::new(ConfigManager::builder().with_client(client.clone()).build()?);
/// let env = Arc::new(Environment::new());
/// let document = DocumentKey::new("app.properties", "DEFAULT_GROUP");
/// env.add_last(PropertySource::remote(&document, true, FlatProperties::new()));
///
/// let coordinator = PropertySourceRefreshCoordinator::new(manager, env.clone(), Arc::new(LoggingRefresher));
/// let event = RefreshEvent::new("app.properties", "DEFAULT_GROUP", "push");
/// assert_eq!(coordinator.on_refresh_event(&event)?, RefreshOutcome::Dropped);
///
/// coordinator.on_application_ready();
/// client.publish_config("app.properties", "DEFAULT_GROUP", "a=1")?;
/// assert_eq!(coordinator.on_refresh_event(&event)?, RefreshOutcome::Replaced);
/// assert_eq!(env.get_property("a").as_deref(), Some("1"));
/// # Ok(())
/// # }
/// ```
pub struct PropertySourceRefreshCoordinator {
    manager: Arc<ConfigManager>,
    builder: PropertySourceBuilder,
    environment: Arc<Environment>,
    refresher: Arc<dyn ContextRefresher>,
    ready: AtomicBool,
    subscribed: DashSet<DocumentKey>,
}

impl PropertySourceRefreshCoordinator {
    /// Creates a coordinator in the not-ready state.
    pub fn new(
        manager: Arc<ConfigManager>,
        environment: Arc<Environment>,
        refresher: Arc<dyn ContextRefresher>,
    ) -> Self {
        PropertySourceRefreshCoordinator {
            builder: PropertySourceBuilder::new(Arc::clone(&manager)),
            manager,
            environment,
            refresher,
            ready: AtomicBool::new(false),
            subscribed: DashSet::new(),
        }
    }

    /// Starts handling refresh events.
    pub fn on_application_ready(&self) {
        if !self.ready.swap(true, Ordering::SeqCst) {
            tracing::info!("Application ready, property source refresh enabled");
        }
    }

    /// `true` once the application is ready.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    /// Rebuilds and replaces the remote source the event refers to.
    ///
    /// # Errors
    ///
    /// Returns the builder's error; the environment is left unchanged.
    pub fn on_refresh_event(&self, event: &RefreshEvent) -> Result<RefreshOutcome> {
        if !self.is_ready() {
            tracing::debug!(
                "Dropping refresh of {},{} before application ready",
                event.data_id(),
                event.group()
            );
            return Ok(RefreshOutcome::Dropped);
        }

        let document = event.document();
        let name = document.source_name();
        let current = match self.environment.get(&name) {
            Some(source) if source.is_remote() => source,
            _ => {
                tracing::debug!("No remote property source named {}", name);
                return Ok(RefreshOutcome::NotManaged);
            }
        };

        let rebuilt = self.builder.build(&document, current.is_refreshable())?;
        if self.environment.replace(&name, rebuilt).is_none() {
            // removed while rebuilding
            return Ok(RefreshOutcome::NotManaged);
        }
        tracing::info!(
            "Replaced property source {} ({})",
            name,
            event.description()
        );

        self.refresher
            .refresh(&format!("property source {} changed", name));
        Ok(RefreshOutcome::Replaced)
    }

    /// Subscribes a [`RefreshEventListener`] to every refreshable remote source
    /// not subscribed yet. Does nothing when refresh is disabled in the settings.
    ///
    /// Returns the number of new subscriptions.
    pub fn subscribe_sources(self: &Arc<Self>) -> Result<usize> {
        if !self.manager.settings().refresh_enabled {
            tracing::debug!("Property source refresh disabled");
            return Ok(0);
        }

        let mut added = 0;
        for source in self.environment.sources() {
            if !source.is_refreshable() {
                continue;
            }
            let Some(document) = document_of(source.name()) else {
                tracing::warn!("Cannot derive a document from source name {}", source.name());
                continue;
            };
            if !self.subscribed.insert(document.clone()) {
                continue;
            }

            let listener = Arc::new(RefreshEventListener {
                document: document.clone(),
                coordinator: Arc::clone(self),
            });
            if let Err(e) = self.manager.client().add_listener(&document, listener) {
                self.subscribed.remove(&document);
                return Err(e);
            }
            tracing::info!("Listening for changes of property source {}", source.name());
            added += 1;
        }
        Ok(added)
    }
}

fn document_of(source_name: &str) -> Option<DocumentKey> {
    let (data_id, group) = source_name.rsplit_once(SOURCE_NAME_SEPARATOR)?;
    if data_id.is_empty() {
        return None;
    }
    Some(DocumentKey::new(data_id, group))
}

/// Turns pushes of a remote source's document into refresh events.
pub struct RefreshEventListener {
    document: DocumentKey,
    coordinator: Arc<PropertySourceRefreshCoordinator>,
}

impl ConfigListener for RefreshEventListener {
    fn receive_config_info(&self, _content: &str) -> Result<()> {
        let event = RefreshEvent::new(
            self.document.data_id(),
            self.document.group(),
            "config pushed",
        );
        self.coordinator.on_refresh_event(&event).map(|_| ())
    }

    fn describe(&self) -> String {
        format!("refresh of property source {}", self.document.source_name())
    }
}
