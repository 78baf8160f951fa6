// SPDX-License-Identifier: MIT OR Apache-2.0

//! The listener the binder subscribes for every bound member.
//!
//! One generic [`BindingListener`] covers all declaration kinds. Its shape decides
//! how pushes are handled:
//!
//! - whole-document listeners hand the complete new content to the member;
//! - key-filtered listeners diff the push against the last processed content and
//!   only deliver when a changed key matches their keys or prefixes.
//!
//! The listener holds its bean weakly. Once the bean is dropped, deliveries become
//! no-ops.

use crate::domain::{ChangeEvent, ConfigError, DocumentKey, Result};
use crate::ports::{AnyBean, ConfigListener, RefreshableTarget};
use crate::service::coercion::{or_default, resolve_raw, ValueKind};
use crate::service::differ::ContentDiffer;
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, Weak};

/// A bean shared between its owner and the binder's listeners.
pub type Bean<T> = Arc<RwLock<T>>;

/// Converts a raw value and stores or passes it into the bean.
pub type ValueSink<T> = Arc<dyn Fn(&mut T, &str) -> Result<()> + Send + Sync>;

/// Handles a whole change event.
pub type EventSink<T> = Arc<dyn Fn(&mut T, &ChangeEvent) -> Result<()> + Send + Sync>;

/// Exact keys and key prefixes a listener is interested in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyFilter {
    keys: Vec<String>,
    prefixes: Vec<String>,
}

impl KeyFilter {
    /// Creates a filter. Empty strings are ignored.
    pub fn new<K, P>(keys: K, prefixes: P) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let non_empty = |s: &String| !s.is_empty();
        KeyFilter {
            keys: keys.into_iter().map(Into::into).filter(non_empty).collect(),
            prefixes: prefixes.into_iter().map(Into::into).filter(non_empty).collect(),
        }
    }

    /// A filter for a single key.
    pub fn key(key: impl Into<String>) -> Self {
        Self::new([key.into()], Vec::<String>::new())
    }

    /// Exact keys.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Key prefixes.
    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Returns `true` if the event should be delivered.
    ///
    /// A filter without keys and prefixes accepts every event, including an
    /// empty one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use nacos_binder::domain::{ChangeEvent, ChangeItem};
    /// use nacos_binder::service::KeyFilter;
    ///
    /// let filter = KeyFilter::key("a.b");
    /// let unrelated: ChangeEvent = vec![ChangeItem::added("c.d", "1")].into_iter().collect();
    /// let related: ChangeEvent = vec![ChangeItem::added("a.b", "1")].into_iter().collect();
    ///
    /// assert!(!filter.matches(&unrelated));
    /// assert!(filter.matches(&related));
    /// ```
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if self.keys.is_empty() && self.prefixes.is_empty() {
            return true;
        }
        event.items().any(|item| {
            self.keys.iter().any(|k| k == item.key())
                || self.prefixes.iter().any(|p| item.key().starts_with(p.as_str()))
        })
    }
}

/// How a listener reacts to a push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerShape {
    /// Deliver every new content as a whole.
    WholeDocument,
    /// Diff against the last content and deliver matching events only.
    KeyFiltered(KeyFilter),
}

/// What a listener delivers to.
pub enum BindingTarget<T> {
    /// A bound field.
    Field {
        /// Field name
        name: String,
        /// Property key inside the document
        key: Option<String>,
        /// Value used when the document yields nothing
        default: Option<String>,
        /// How the field type is produced
        kind: ValueKind,
        /// Coerces and assigns the value
        assign: ValueSink<T>,
    },
    /// A method taking one value.
    Method {
        /// Method signature
        signature: String,
        /// Property key inside the document
        key: Option<String>,
        /// Coerces the value and calls the method
        invoke: ValueSink<T>,
    },
    /// A method taking the whole change event.
    KeysMethod {
        /// Method signature
        signature: String,
        /// Calls the method
        handler: EventSink<T>,
    },
}

impl<T> BindingTarget<T> {
    fn shape(&self) -> ListenerShape {
        match self {
            BindingTarget::Field { key: Some(key), .. }
            | BindingTarget::Method { key: Some(key), .. } => {
                ListenerShape::KeyFiltered(KeyFilter::key(key.as_str()))
            }
            BindingTarget::Field { key: None, .. } | BindingTarget::Method { key: None, .. } => {
                ListenerShape::WholeDocument
            }
            BindingTarget::KeysMethod { .. } => ListenerShape::KeyFiltered(KeyFilter::default()),
        }
    }
}

/// Push-channel listener bound to one member of one bean.
pub struct BindingListener<T> {
    registration_key: String,
    document: DocumentKey,
    shape: ListenerShape,
    target: RwLock<Weak<RwLock<T>>>,
    binding: BindingTarget<T>,
    // Held for the whole delivery so pushes are processed one at a time.
    last_content: Mutex<Option<String>>,
}

impl<T: Send + Sync + 'static> BindingListener<T> {
    /// Creates a listener delivering to `bean`.
    ///
    /// Keys listeners pass their filter through `filter`; it is ignored for the
    /// other targets, whose shape follows from their key.
    pub fn new(
        registration_key: impl Into<String>,
        document: DocumentKey,
        bean: &Bean<T>,
        binding: BindingTarget<T>,
        filter: Option<KeyFilter>,
    ) -> Self {
        let shape = match (&binding, filter) {
            (BindingTarget::KeysMethod { .. }, Some(filter)) => ListenerShape::KeyFiltered(filter),
            _ => binding.shape(),
        };
        BindingListener {
            registration_key: registration_key.into(),
            document,
            shape,
            target: RwLock::new(Arc::downgrade(bean)),
            binding,
            last_content: Mutex::new(None),
        }
    }

    /// Registration key of the bound member.
    pub fn registration_key(&self) -> &str {
        &self.registration_key
    }

    /// The document this listener follows.
    pub fn document(&self) -> &DocumentKey {
        &self.document
    }

    /// The listener's shape.
    pub fn shape(&self) -> &ListenerShape {
        &self.shape
    }

    /// Content the next push is diffed against.
    pub fn last_content(&self) -> Option<String> {
        self.last_content.lock().clone()
    }

    /// Seeds the diff baseline.
    pub fn set_last_content(&self, content: Option<String>) {
        *self.last_content.lock() = content;
    }

    fn current_bean(&self) -> Option<Bean<T>> {
        self.target.read().upgrade()
    }

    fn deliver_content(&self, content: &str) -> Result<()> {
        let Some(bean) = self.current_bean() else {
            tracing::debug!("Bean of {} is gone, dropping push", self.registration_key);
            return Ok(());
        };

        match &self.binding {
            BindingTarget::Field {
                name,
                default,
                kind,
                assign,
                ..
            } => {
                if let Some(raw) = resolve_raw(content, None, Some(name), *kind, default.as_deref())? {
                    assign(&mut *bean.write(), &raw)?;
                }
            }
            BindingTarget::Method { invoke, .. } => {
                if !content.trim().is_empty() {
                    invoke(&mut *bean.write(), content)?;
                }
            }
            BindingTarget::KeysMethod { .. } => {}
        }
        Ok(())
    }

    fn deliver_event(&self, event: &ChangeEvent) -> Result<()> {
        let Some(bean) = self.current_bean() else {
            tracing::debug!("Bean of {} is gone, dropping push", self.registration_key);
            return Ok(());
        };

        match &self.binding {
            BindingTarget::Field {
                key: Some(key),
                default,
                assign,
                ..
            } => {
                let new_value = event.item(key).and_then(|item| item.new_value());
                if let Some(raw) = or_default(new_value, default.as_deref()) {
                    assign(&mut *bean.write(), &raw)?;
                }
            }
            BindingTarget::Method {
                key: Some(key),
                invoke,
                ..
            } => {
                let new_value = event.item(key).and_then(|item| item.new_value());
                if let Some(raw) = or_default(new_value, None) {
                    invoke(&mut *bean.write(), &raw)?;
                }
            }
            BindingTarget::KeysMethod { handler, .. } => {
                handler(&mut *bean.write(), event)?;
            }
            BindingTarget::Field { key: None, .. } | BindingTarget::Method { key: None, .. } => {}
        }
        Ok(())
    }
}

impl<T: Send + Sync + 'static> ConfigListener for BindingListener<T> {
    fn receive_config_info(&self, content: &str) -> Result<()> {
        let mut last_content = self.last_content.lock();

        match &self.shape {
            ListenerShape::WholeDocument => self.deliver_content(content)?,
            ListenerShape::KeyFiltered(filter) => {
                let event =
                    ContentDiffer::diff(last_content.as_deref(), content, self.document.format())?;
                if filter.matches(&event) {
                    self.deliver_event(&event)?;
                } else {
                    tracing::debug!(
                        "No interesting change for {} in {} ({} changed key(s))",
                        self.registration_key,
                        self.document,
                        event.len()
                    );
                }
            }
        }

        *last_content = Some(content.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.binding {
            BindingTarget::Field { key, .. } | BindingTarget::Method { key, .. } => format!(
                "{} (key {})",
                self.registration_key,
                key.as_deref().unwrap_or("<whole document>")
            ),
            BindingTarget::KeysMethod { .. } => self.registration_key.clone(),
        }
    }
}

impl<T: Send + Sync + 'static> RefreshableTarget for BindingListener<T> {
    fn target(&self) -> Option<AnyBean> {
        self.current_bean().map(|bean| bean as AnyBean)
    }

    fn set_target(&self, target: AnyBean) -> Result<()> {
        let bean = target
            .downcast::<RwLock<T>>()
            .map_err(|_| ConfigError::TargetTypeMismatch {
                registration_key: self.registration_key.clone(),
                expected: std::any::type_name::<T>().to_string(),
            })?;
        *self.target.write() = Arc::downgrade(&bean);
        Ok(())
    }
}
