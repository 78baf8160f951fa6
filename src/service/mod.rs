// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer: binding, listening and refreshing.
//!
//! This module wires the ports together. The [`ConfigBinder`] binds bean members
//! to documents and keeps them current through [`BindingListener`]s, and the
//! [`PropertySourceRefreshCoordinator`] keeps remote property sources current.

pub mod binder;
pub mod coercion;
pub mod content_cache;
pub mod differ;
pub mod listener;
pub mod manager;
pub mod refresh;
pub mod registry;

// Re-export commonly used types
pub use binder::{BeanBindings, ConfigBinder, ConfigBinding, KeysListenerBinding, ListenerBinding};
pub use coercion::{BindValue, Json, ValueKind};
pub use content_cache::CachedContent;
pub use differ::ContentDiffer;
pub use listener::{Bean, BindingListener, BindingTarget, KeyFilter, ListenerShape};
pub use manager::{ConfigManager, ConfigManagerBuilder};
pub use refresh::{
    PropertySourceBuilder, PropertySourceRefreshCoordinator, RefreshEvent, RefreshEventListener,
    RefreshOutcome,
};
pub use registry::{Registration, TargetRegistry};
