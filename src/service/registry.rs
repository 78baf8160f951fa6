// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registration key → live listener map.

use crate::domain::Result;
use crate::ports::{AnyBean, RefreshableTarget};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Outcome of [`TargetRegistry::register_or_rebind`].
pub enum Registration {
    /// A new listener was built and subscribed.
    Registered(Arc<dyn RefreshableTarget>),
    /// An existing listener now delivers to the new bean.
    Rebound(Arc<dyn RefreshableTarget>),
}

impl Registration {
    /// `true` if a new listener was created.
    pub fn is_new(&self) -> bool {
        matches!(self, Registration::Registered(_))
    }

    /// The live listener for the key.
    pub fn listener(&self) -> &Arc<dyn RefreshableTarget> {
        match self {
            Registration::Registered(listener) | Registration::Rebound(listener) => listener,
        }
    }
}

/// Keeps at most one subscribed listener per registration key.
///
/// Keys have the form `beanName#field#fieldName` or
/// `beanName#method#name(param::Type)`. A bean that is processed again under the
/// same name takes over the existing listener instead of subscribing a new one.
///
/// The check-and-insert is atomic per key: concurrent registrations of one key
/// build exactly one listener.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::domain::Result;
/// use nacos_binder::ports::{AnyBean, RefreshableTarget};
/// use nacos_binder::service::TargetRegistry;
/// use parking_lot::Mutex;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Slot(Mutex<Option<AnyBean>>);
///
/// impl RefreshableTarget for Slot {
///     fn target(&self) -> Option<AnyBean> {
///         self.0.lock().clone()
///     }
///     fn set_target(&self, target: AnyBean) -> Result<()> {
///         *self.0.lock() = Some(target);
///         Ok(())
///     }
/// }
///
/// let registry = TargetRegistry::new();
/// let first = registry
///     .register_or_rebind("svc#field#timeout", Arc::new(1_u32), || Ok(Arc::new(Slot::default())))
///     .unwrap();
/// let second = registry
///     .register_or_rebind("svc#field#timeout", Arc::new(2_u32), || unreachable!())
///     .unwrap();
///
/// assert!(first.is_new());
/// assert!(!second.is_new());
/// assert_eq!(registry.len(), 1);
/// ```
#[derive(Default)]
pub struct TargetRegistry {
    listeners: DashMap<String, Arc<dyn RefreshableTarget>>,
}

impl TargetRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebinds the listener registered under `key` to `target`, or builds one with
    /// `factory` if there is none.
    ///
    /// `factory` is expected to subscribe the listener it builds. It runs at most
    /// once per key; if it fails nothing is stored and a later call retries.
    pub fn register_or_rebind<F>(
        &self,
        key: &str,
        target: AnyBean,
        factory: F,
    ) -> Result<Registration>
    where
        F: FnOnce() -> Result<Arc<dyn RefreshableTarget>>,
    {
        match self.listeners.entry(key.to_string()) {
            Entry::Occupied(entry) => {
                let listener = Arc::clone(entry.get());
                listener.set_target(target)?;
                tracing::info!("Rebound listener {} to a new bean", key);
                Ok(Registration::Rebound(listener))
            }
            Entry::Vacant(entry) => {
                let listener = factory()?;
                entry.insert(Arc::clone(&listener));
                tracing::info!("Registered listener {}", key);
                Ok(Registration::Registered(listener))
            }
        }
    }

    /// The listener registered under `key`.
    pub fn get(&self, key: &str) -> Option<Arc<dyn RefreshableTarget>> {
        self.listeners.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Returns `true` if `key` has a listener.
    pub fn contains(&self, key: &str) -> bool {
        self.listeners.contains_key(key)
    }

    /// Registered keys, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.listeners.iter().map(|e| e.key().clone()).collect()
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
