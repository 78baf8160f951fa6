// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dynamic configuration binding and refresh for config-service documents.
//!
//! This crate binds members of application beans to documents held by a
//! Nacos-style config service (documents addressed by `dataId` and `group`), keeps
//! them current as the service pushes new content, and swaps rebuilt remote
//! property sources into an ordered environment.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types (`DocumentKey`, `FlatProperties`, `ChangeEvent`,
//!   `Environment`, `ClientSettings`, errors)
//! - **Ports**: Trait definitions for the collaborators (`ConfigClient`,
//!   `ConfigListener`, `RefreshableTarget`, `ContextRefresher`, `ConfigParser`,
//!   `ConfigWatcher`)
//! - **Adapters**: Parsers and config clients (in-memory, directory-backed)
//! - **Service**: The binder, listeners, registry, content cache and refresh
//!   coordinator
//!
//! # Features
//!
//! - **Change Detection**: Two versions of a document are diffed into key-level
//!   ADDED/MODIFIED/DELETED change items
//! - **Deduplicated Listeners**: At most one subscription per bean member; a
//!   re-created bean takes over the existing listener
//! - **Type Coercion**: Primitives, strings, flattened properties and
//!   JSON-deserialized structures
//! - **Property Source Refresh**: Remote sources are rebuilt and replaced in place
//!   once the application is ready
//!
//! # Feature Flags
//!
//! - `reload`: Filesystem watching for the directory-backed client
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use nacos_binder::prelude::*;
//! use parking_lot::RwLock;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Server {
//!     timeout: i32,
//!     retries: i64,
//! }
//!
//! # fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(MemoryConfigClient::new());
//! client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=30\nretries=3")?;
//!
//! let manager = Arc::new(ConfigManager::builder().with_client(client.clone()).build()?);
//! let binder = ConfigBinder::new(manager);
//! binder.register_bindings(
//!     BeanBindings::new()
//!         .field(ConfigBinding::new("timeout", "app.properties", |s: &mut Server, v: i32| s.timeout = v))
//!         .field(
//!             ConfigBinding::new("retries", "app.properties", |s: &mut Server, v: i64| s.retries = v)
//!                 .key("retries")
//!                 .default_value("1"),
//!         ),
//! );
//!
//! let server = Arc::new(RwLock::new(Server::default()));
//! binder.post_process_after_initialization(&server, "server")?;
//! assert_eq!(server.read().timeout, 30);
//! assert_eq!(server.read().retries, 3);
//!
//! client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=60")?;
//! assert_eq!(server.read().timeout, 60);
//! assert_eq!(server.read().retries, 1);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ChangeEvent, ChangeItem, ChangeKind, ClientSettings, ConfigError, DocumentKey,
        Environment, FlatProperties, PropertySource, Result,
    };
    pub use crate::ports::{ConfigClient, ConfigListener, ContextRefresher, RefreshableTarget};

    pub use crate::adapters::{FileConfigClient, MemoryConfigClient};
    pub use crate::service::{
        BeanBindings, ConfigBinder, ConfigBinding, ConfigManager, Json, KeysListenerBinding,
        ListenerBinding, PropertySourceRefreshCoordinator, RefreshEvent,
    };
}
