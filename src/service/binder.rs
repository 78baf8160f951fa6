// SPDX-License-Identifier: MIT OR Apache-2.0

//! Binding of bean members to configuration documents.
//!
//! Bean types declare their bindings once in a [`BeanBindings`] table and register
//! it with the [`ConfigBinder`]. Every time a bean of that type finishes
//! initialization, [`ConfigBinder::post_process_after_initialization`] assigns the
//! current values and subscribes one listener per member. Processing a bean again
//! under the same name re-points the existing listeners at the new instance.

use crate::domain::{ChangeEvent, ConfigError, DocumentKey, Result};
use crate::ports::{AnyBean, ConfigListener, RefreshableTarget};
use crate::service::coercion::{resolve_raw, BindValue, ValueKind};
use crate::service::content_cache::CachedContent;
use crate::service::listener::{
    Bean, BindingListener, BindingTarget, EventSink, KeyFilter, ValueSink,
};
use crate::service::manager::ConfigManager;
use crate::service::registry::{Registration, TargetRegistry};
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

fn value_sink<T, V, F>(setter: F) -> ValueSink<T>
where
    V: BindValue,
    F: Fn(&mut T, V) + Send + Sync + 'static,
{
    Arc::new(move |bean: &mut T, raw: &str| -> Result<()> {
        setter(bean, V::from_content(raw)?);
        Ok(())
    })
}

/// A field bound to a document or to one property of it.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::service::ConfigBinding;
///
/// #[derive(Default)]
/// struct Server {
///     timeout: i32,
/// }
///
/// let binding = ConfigBinding::new("timeout", "app.properties", |s: &mut Server, v: i32| s.timeout = v)
///     .group("DEFAULT_GROUP")
///     .key("server.timeout")
///     .default_value("5");
/// assert_eq!(binding.name(), "timeout");
/// ```
pub struct ConfigBinding<T> {
    name: String,
    data_id: String,
    group: String,
    key: Option<String>,
    default: Option<String>,
    init_notify: bool,
    kind: ValueKind,
    assign: ValueSink<T>,
}

impl<T: Send + Sync + 'static> ConfigBinding<T> {
    /// Declares field `name` bound to `data_id`, stored through `setter`.
    pub fn new<V, F>(name: impl Into<String>, data_id: impl Into<String>, setter: F) -> Self
    where
        V: BindValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        ConfigBinding {
            name: name.into(),
            data_id: data_id.into(),
            group: String::new(),
            key: None,
            default: None,
            init_notify: false,
            kind: V::kind(),
            assign: value_sink(setter),
        }
    }

    /// Sets the group. Empty means the manager's default group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Binds a single property instead of the whole document.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into()).filter(|k| !k.is_empty());
        self
    }

    /// Value assigned when the document yields nothing.
    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Delivers the current content once more right after binding.
    pub fn init_notify(mut self, init_notify: bool) -> Self {
        self.init_notify = init_notify;
        self
    }

    /// The field name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A method invoked with one value whenever the document changes.
pub struct ListenerBinding<T> {
    name: String,
    data_id: String,
    group: String,
    key: Option<String>,
    init_notify: bool,
    param_type: &'static str,
    invoke: ValueSink<T>,
}

impl<T: Send + Sync + 'static> ListenerBinding<T> {
    /// Declares method `name` listening on `data_id`.
    pub fn new<V, F>(name: impl Into<String>, data_id: impl Into<String>, handler: F) -> Self
    where
        V: BindValue,
        F: Fn(&mut T, V) + Send + Sync + 'static,
    {
        ListenerBinding {
            name: name.into(),
            data_id: data_id.into(),
            group: String::new(),
            key: None,
            init_notify: false,
            param_type: type_name::<V>(),
            invoke: value_sink(handler),
        }
    }

    /// Sets the group. Empty means the manager's default group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Listens to a single property instead of the whole document.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into()).filter(|k| !k.is_empty());
        self
    }

    /// Invokes the method with the current content right after binding.
    pub fn init_notify(mut self, init_notify: bool) -> Self {
        self.init_notify = init_notify;
        self
    }

    /// `name(param::Type)`
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, self.param_type)
    }
}

/// A method receiving the change events of selected keys.
pub struct KeysListenerBinding<T> {
    name: String,
    data_id: String,
    group: String,
    keys: Vec<String>,
    prefixes: Vec<String>,
    handler: EventSink<T>,
}

impl<T: Send + Sync + 'static> KeysListenerBinding<T> {
    /// Declares method `name` receiving change events of `data_id`.
    pub fn new<F>(name: impl Into<String>, data_id: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut T, &ChangeEvent) + Send + Sync + 'static,
    {
        KeysListenerBinding {
            name: name.into(),
            data_id: data_id.into(),
            group: String::new(),
            keys: Vec::new(),
            prefixes: Vec::new(),
            handler: Arc::new(move |bean: &mut T, event: &ChangeEvent| -> Result<()> {
                handler(bean, event);
                Ok(())
            }),
        }
    }

    /// Sets the group. Empty means the manager's default group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Exact keys that trigger the method.
    pub fn interested_keys<I>(mut self, keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Key prefixes that trigger the method.
    pub fn interested_key_prefixes<I>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.prefixes.extend(prefixes.into_iter().map(Into::into));
        self
    }

    /// `name(ChangeEvent)` with the fully-qualified event type.
    pub fn signature(&self) -> String {
        format!("{}({})", self.name, type_name::<ChangeEvent>())
    }
}

/// The binding table of one bean type.
///
/// Members are processed fields first, then value listeners, then keys
/// listeners, each in declaration order.
pub struct BeanBindings<T> {
    fields: Vec<ConfigBinding<T>>,
    listeners: Vec<ListenerBinding<T>>,
    keys_listeners: Vec<KeysListenerBinding<T>>,
}

impl<T> Default for BeanBindings<T> {
    fn default() -> Self {
        BeanBindings {
            fields: Vec::new(),
            listeners: Vec::new(),
            keys_listeners: Vec::new(),
        }
    }
}

impl<T: Send + Sync + 'static> BeanBindings<T> {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field binding.
    pub fn field(mut self, binding: ConfigBinding<T>) -> Self {
        self.fields.push(binding);
        self
    }

    /// Adds a value listener.
    pub fn listener(mut self, binding: ListenerBinding<T>) -> Self {
        self.listeners.push(binding);
        self
    }

    /// Adds a keys listener.
    pub fn keys_listener(mut self, binding: KeysListenerBinding<T>) -> Self {
        self.keys_listeners.push(binding);
        self
    }

    /// Number of declared members.
    pub fn len(&self) -> usize {
        self.fields.len() + self.listeners.len() + self.keys_listeners.len()
    }

    /// Returns `true` if nothing is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn has_text(content: Option<&str>) -> bool {
    content.is_some_and(|c| !c.trim().is_empty())
}

/// Assigns bound members and subscribes their listeners.
///
/// # Examples
///
/// ```rust
/// use nacos_binder::adapters::MemoryConfigClient;
/// use nacos_binder::service::{BeanBindings, ConfigBinder, ConfigBinding, ConfigManager};
/// use parking_lot::RwLock;
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Server {
///     timeout: i32,
/// }
///
/// # fn main() -> nacos_binder::domain::Result<()> {
/// let client = Arc::new(MemoryConfigClient::new());
/// client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=30")?;
///
/// let manager = Arc::new(ConfigManager::builder().with_client(client.clone()).build()?);
/// let binder = ConfigBinder::new(manager);
/// binder.register_bindings(
///     BeanBindings::new()
///         .field(ConfigBinding::new("timeout", "app.properties", |s: &mut Server, v: i32| s.timeout = v)),
/// );
///
/// let server = Arc::new(RwLock::new(Server::default()));
/// binder.post_process_after_initialization(&server, "server")?;
/// assert_eq!(server.read().timeout, 30);
///
/// client.publish_config("app.properties", "DEFAULT_GROUP", "timeout=60")?;
/// assert_eq!(server.read().timeout, 60);
/// # Ok(())
/// # }
/// ```
pub struct ConfigBinder {
    manager: Arc<ConfigManager>,
    cache: CachedContent,
    registry: TargetRegistry,
    bindings: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl ConfigBinder {
    /// Creates a binder fetching through `manager`.
    pub fn new(manager: Arc<ConfigManager>) -> Self {
        let cache = CachedContent::new(Arc::clone(manager.client()), manager.timeout());
        ConfigBinder {
            manager,
            cache,
            registry: TargetRegistry::new(),
            bindings: DashMap::new(),
        }
    }

    /// Registers the binding table of bean type `T`, replacing any earlier one.
    pub fn register_bindings<T: Send + Sync + 'static>(&self, bindings: BeanBindings<T>) {
        tracing::debug!(
            "Registered {} binding(s) for {}",
            bindings.len(),
            type_name::<T>()
        );
        self.bindings.insert(TypeId::of::<T>(), Arc::new(bindings));
    }

    /// The listener registry.
    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    /// The content cache.
    pub fn cache(&self) -> &CachedContent {
        &self.cache
    }

    /// Binds every declared member of `bean`.
    ///
    /// A failing member does not stop the others. All failures are returned
    /// together, each wrapped as `ConfigBindingError` naming its registration key.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::BeanBindingFailed` if any member failed.
    pub fn post_process_after_initialization<T: Send + Sync + 'static>(
        &self,
        bean: &Bean<T>,
        bean_name: &str,
    ) -> Result<()> {
        let Some(bindings) = self.bindings_for::<T>() else {
            tracing::debug!("No bindings declared for {} ({})", bean_name, type_name::<T>());
            return Ok(());
        };

        let mut failures = Vec::new();
        let mut record = |registration_key: String, result: Result<()>| {
            if let Err(e) = result {
                tracing::error!("Failed to bind {}: {}", registration_key, e);
                failures.push(e.for_member(registration_key));
            }
        };

        for field in &bindings.fields {
            let registration_key = format!("{}#field#{}", bean_name, field.name);
            let result = self.bind_field(bean, &registration_key, field);
            record(registration_key, result);
        }
        for listener in &bindings.listeners {
            let registration_key = format!("{}#method#{}", bean_name, listener.signature());
            let result = self.bind_listener(bean, &registration_key, listener);
            record(registration_key, result);
        }
        for keys_listener in &bindings.keys_listeners {
            let registration_key = format!("{}#method#{}", bean_name, keys_listener.signature());
            let result = self.bind_keys_listener(bean, &registration_key, keys_listener);
            record(registration_key, result);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::BeanBindingFailed {
                bean_name: bean_name.to_string(),
                failures,
            })
        }
    }

    fn bindings_for<T: Send + Sync + 'static>(&self) -> Option<Arc<BeanBindings<T>>> {
        let entry = self.bindings.get(&TypeId::of::<T>())?;
        Arc::clone(entry.value()).downcast::<BeanBindings<T>>().ok()
    }

    fn bind_field<T: Send + Sync + 'static>(
        &self,
        bean: &Bean<T>,
        registration_key: &str,
        field: &ConfigBinding<T>,
    ) -> Result<()> {
        let document = self.manager.resolve_document(&field.data_id, &field.group)?;
        let content = self.cache.get(&document)?;

        let raw = resolve_raw(
            content.as_deref().unwrap_or(""),
            field.key.as_deref(),
            Some(&field.name),
            field.kind,
            field.default.as_deref(),
        )?;
        if let Some(raw) = &raw {
            (field.assign)(&mut *bean.write(), raw)?;
        }

        let target = BindingTarget::Field {
            name: field.name.clone(),
            key: field.key.clone(),
            default: field.default.clone(),
            kind: field.kind,
            assign: Arc::clone(&field.assign),
        };
        let seed = field.key.is_some() && !field.init_notify;
        let registration =
            self.register(bean, registration_key, &document, target, None, seed.then(|| content.clone()))?;

        if field.init_notify && raw.is_some() {
            self.notify_initial(&registration, content.as_deref())?;
        }
        self.catch_up(&registration, &document, &content)
    }

    fn bind_listener<T: Send + Sync + 'static>(
        &self,
        bean: &Bean<T>,
        registration_key: &str,
        listener: &ListenerBinding<T>,
    ) -> Result<()> {
        let document = self.manager.resolve_document(&listener.data_id, &listener.group)?;
        let content = self.cache.get(&document)?;

        let target = BindingTarget::Method {
            signature: listener.signature(),
            key: listener.key.clone(),
            invoke: Arc::clone(&listener.invoke),
        };
        let seed = listener.key.is_some() && !listener.init_notify;
        let registration = self.register(
            bean,
            registration_key,
            &document,
            target,
            None,
            seed.then(|| content.clone()),
        )?;

        if listener.init_notify {
            let raw = resolve_raw(
                content.as_deref().unwrap_or(""),
                listener.key.as_deref(),
                None,
                ValueKind::Text,
                None,
            )?;
            if raw.is_some() {
                self.notify_initial(&registration, content.as_deref())?;
            }
        }
        self.catch_up(&registration, &document, &content)
    }

    fn bind_keys_listener<T: Send + Sync + 'static>(
        &self,
        bean: &Bean<T>,
        registration_key: &str,
        listener: &KeysListenerBinding<T>,
    ) -> Result<()> {
        let document = self.manager.resolve_document(&listener.data_id, &listener.group)?;
        let content = self.cache.get(&document)?;

        let target = BindingTarget::KeysMethod {
            signature: listener.signature(),
            handler: Arc::clone(&listener.handler),
        };
        let filter = KeyFilter::new(listener.keys.iter().cloned(), listener.prefixes.iter().cloned());
        let registration = self.register(
            bean,
            registration_key,
            &document,
            target,
            Some(filter),
            Some(content.clone()),
        )?;
        self.catch_up(&registration, &document, &content)
    }

    /// Registers a new listener, or re-points the existing one at `bean`.
    ///
    /// `seed` is the diff baseline of a newly built listener. The returned
    /// listener is only present for new registrations.
    fn register<T: Send + Sync + 'static>(
        &self,
        bean: &Bean<T>,
        registration_key: &str,
        document: &DocumentKey,
        target: BindingTarget<T>,
        filter: Option<KeyFilter>,
        seed: Option<Option<String>>,
    ) -> Result<Option<Arc<BindingListener<T>>>> {
        let mut created = None;
        let registration = self.registry.register_or_rebind(
            registration_key,
            Arc::clone(bean) as AnyBean,
            || {
                let listener = Arc::new(BindingListener::new(
                    registration_key,
                    document.clone(),
                    bean,
                    target,
                    filter,
                ));
                if let Some(baseline) = seed {
                    listener.set_last_content(baseline);
                }
                self.manager
                    .client()
                    .add_listener(document, Arc::clone(&listener) as Arc<dyn ConfigListener>)?;
                created = Some(Arc::clone(&listener));
                Ok(listener as Arc<dyn RefreshableTarget>)
            },
        )?;

        Ok(match registration {
            Registration::Registered(_) => created,
            Registration::Rebound(_) => None,
        })
    }

    /// Delivers content that reached the cache after `fetched` was read but
    /// before the new listener was subscribed.
    fn catch_up<T: Send + Sync + 'static>(
        &self,
        registration: &Option<Arc<BindingListener<T>>>,
        document: &DocumentKey,
        fetched: &Option<String>,
    ) -> Result<()> {
        let Some(listener) = registration else {
            return Ok(());
        };
        let current = self.cache.peek(document);
        if current == *fetched {
            return Ok(());
        }
        let latest = current.unwrap_or_default();
        if listener.last_content().as_deref() == Some(latest.as_str()) {
            return Ok(());
        }
        tracing::debug!(
            "Delivering {} to {} pushed while subscribing",
            document,
            listener.registration_key()
        );
        listener.receive_config_info(&latest)
    }

    fn notify_initial<T: Send + Sync + 'static>(
        &self,
        registration: &Option<Arc<BindingListener<T>>>,
        content: Option<&str>,
    ) -> Result<()> {
        match (registration, content) {
            (Some(listener), Some(content)) if has_text(Some(content)) => {
                tracing::debug!("Initial notification of {}", listener.registration_key());
                listener.receive_config_info(content)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryConfigClient;
    use crate::domain::{ChangeKind, FlatProperties};
    use crate::service::Json;
    use parking_lot::RwLock;
    use crate::ports::ConfigClient;
    use serde::Deserialize;
    use std::time::Duration;

    const DATA_ID: &str = "app.properties";
    const GROUP: &str = "DEFAULT_GROUP";

    #[derive(Clone, Debug, Default, Deserialize, PartialEq)]
    struct Pool {
        size: u32,
    }

    #[derive(Default)]
    struct Service {
        timeout: i32,
        retries: i64,
        enabled: bool,
        raw: String,
        pool: Pool,
        props: FlatProperties,
        calls: Vec<String>,
        events: Vec<Vec<(String, ChangeKind)>>,
    }

    fn setup() -> (Arc<MemoryConfigClient>, ConfigBinder) {
        let client = Arc::new(MemoryConfigClient::new());
        let manager = ConfigManager::builder()
            .with_client(client.clone())
            .build()
            .unwrap();
        (client, ConfigBinder::new(Arc::new(manager)))
    }

    fn bean() -> Bean<Service> {
        Arc::new(RwLock::new(Service::default()))
    }

    fn timeout_field() -> ConfigBinding<Service> {
        ConfigBinding::new("timeout", DATA_ID, |s: &mut Service, v: i32| s.timeout = v)
    }

    #[test]
    fn test_field_default_then_remote_value() {
        let (client, binder) = setup();
        binder.register_bindings(BeanBindings::new().field(timeout_field().default_value("5")));

        let first = bean();
        binder.post_process_after_initialization(&first, "svc").unwrap();
        assert_eq!(first.read().timeout, 5);

        client.publish_config(DATA_ID, GROUP, "42").unwrap();
        assert_eq!(first.read().timeout, 42);
    }

    #[test]
    fn test_keyed_fields_of_several_types() {
        let (client, binder) = setup();
        client
            .publish_config(DATA_ID, GROUP, "retries=3\nenabled=true\npool={\"size\":4}")
            .unwrap();
        binder.register_bindings(
            BeanBindings::new()
                .field(ConfigBinding::new("retries", DATA_ID, |s: &mut Service, v: i64| s.retries = v).key("retries"))
                .field(ConfigBinding::new("enabled", DATA_ID, |s: &mut Service, v: bool| s.enabled = v).key("enabled"))
                .field(
                    ConfigBinding::new("pool", DATA_ID, |s: &mut Service, v: Json<Pool>| s.pool = v.into_inner())
                        .key("pool"),
                )
                .field(ConfigBinding::new("raw", DATA_ID, |s: &mut Service, v: String| s.raw = v))
                .field(ConfigBinding::new("props", DATA_ID, |s: &mut Service, v: FlatProperties| s.props = v)),
        );

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();

        let svc = svc.read();
        assert_eq!(svc.retries, 3);
        assert!(svc.enabled);
        assert_eq!(svc.pool, Pool { size: 4 });
        assert!(svc.raw.starts_with("retries=3"));
        assert_eq!(svc.props.get("enabled"), Some("true"));
    }

    #[test]
    fn test_rebind_keeps_single_subscription() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "timeout=30").unwrap();
        binder.register_bindings(BeanBindings::new().field(timeout_field()));

        let mut beans = Vec::new();
        for _ in 0..5 {
            let svc = bean();
            binder.post_process_after_initialization(&svc, "svc").unwrap();
            assert_eq!(svc.read().timeout, 30);
            beans.push(svc);
        }

        // cache refresher + one binding listener
        assert_eq!(client.listener_count(&DocumentKey::new(DATA_ID, GROUP)), 2);
        assert_eq!(binder.registry().len(), 1);

        client.publish_config(DATA_ID, GROUP, "timeout=60").unwrap();
        assert_eq!(beans[4].read().timeout, 60);
        assert_eq!(beans[0].read().timeout, 30);
    }

    #[test]
    fn test_method_listener_registration_key_and_delivery() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "a.b=1\nc.d=1").unwrap();
        binder.register_bindings(BeanBindings::new().listener(
            ListenerBinding::new("on_ab", DATA_ID, |s: &mut Service, v: String| s.calls.push(v)).key("a.b"),
        ));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert!(svc.read().calls.is_empty());
        assert!(binder.registry().contains("svc#method#on_ab(alloc::string::String)"));

        client.publish_config(DATA_ID, GROUP, "a.b=1\nc.d=2").unwrap();
        assert!(svc.read().calls.is_empty());

        client.publish_config(DATA_ID, GROUP, "a.b=2\nc.d=2").unwrap();
        assert_eq!(svc.read().calls, vec!["2"]);
    }

    #[test]
    fn test_method_init_notify() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "hello").unwrap();
        binder.register_bindings(BeanBindings::new().listener(
            ListenerBinding::new("on_change", DATA_ID, |s: &mut Service, v: String| s.calls.push(v))
                .init_notify(true),
        ));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert_eq!(svc.read().calls, vec!["hello"]);

        // a rebind does not notify again
        let again = bean();
        binder.post_process_after_initialization(&again, "svc").unwrap();
        assert!(again.read().calls.is_empty());
    }

    #[test]
    fn test_keyed_method_init_notify_delivers_value() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "a.b=7").unwrap();
        binder.register_bindings(BeanBindings::new().listener(
            ListenerBinding::new("on_ab", DATA_ID, |s: &mut Service, v: i32| s.calls.push(v.to_string()))
                .key("a.b")
                .init_notify(true),
        ));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert_eq!(svc.read().calls, vec!["7"]);
    }

    #[test]
    fn test_keys_listener_baseline_is_seeded() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "db.host=a\nname=x").unwrap();
        binder.register_bindings(BeanBindings::new().keys_listener(
            KeysListenerBinding::new("on_db", DATA_ID, |s: &mut Service, e: &ChangeEvent| {
                s.events.push(e.items().map(|i| (i.key().to_string(), i.kind())).collect())
            })
            .interested_key_prefixes(["db."]),
        ));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert!(svc.read().events.is_empty());

        client.publish_config(DATA_ID, GROUP, "db.host=b\nname=x").unwrap();
        assert_eq!(
            svc.read().events,
            vec![vec![("db.host".to_string(), ChangeKind::Modified)]]
        );
    }

    #[test]
    fn test_failures_are_aggregated() {
        let (client, binder) = setup();
        client.publish_config(DATA_ID, GROUP, "timeout=soon\nretries=3").unwrap();
        binder.register_bindings(
            BeanBindings::new()
                .field(timeout_field().key("timeout"))
                .field(ConfigBinding::new("missing", "", |s: &mut Service, v: i32| s.timeout = v))
                .field(ConfigBinding::new("retries", DATA_ID, |s: &mut Service, v: i64| s.retries = v).key("retries")),
        );

        let svc = bean();
        match binder.post_process_after_initialization(&svc, "svc") {
            Err(ConfigError::BeanBindingFailed { bean_name, failures }) => {
                assert_eq!(bean_name, "svc");
                assert_eq!(failures.len(), 2);
                assert!(matches!(
                    &failures[0],
                    ConfigError::ConfigBindingError { member, .. } if member == "svc#field#timeout"
                ));
                assert!(matches!(
                    &failures[1],
                    ConfigError::ConfigBindingError { member, .. } if member == "svc#field#missing"
                ));
            }
            other => panic!("expected aggregated failure, got {:?}", other),
        }
        // the healthy member was still bound
        assert_eq!(svc.read().retries, 3);
    }

    #[test]
    fn test_unparseable_whole_document_fails_binding() {
        let (client, binder) = setup();
        client.publish_config("timeout.txt", GROUP, "thirty").unwrap();
        binder.register_bindings(BeanBindings::new().field(ConfigBinding::new(
            "timeout",
            "timeout.txt",
            |s: &mut Service, v: i32| s.timeout = v,
        )));

        let svc = bean();
        match binder.post_process_after_initialization(&svc, "svc") {
            Err(ConfigError::BeanBindingFailed { failures, .. }) => match &failures[0] {
                ConfigError::ConfigBindingError { member, source } => {
                    assert_eq!(member, "svc#field#timeout");
                    assert!(matches!(**source, ConfigError::ParseError { .. }));
                }
                other => panic!("unexpected failure {:?}", other),
            },
            other => panic!("expected binding failure, got {:?}", other),
        }
        assert_eq!(svc.read().timeout, 0);
    }

    #[test]
    fn test_unparseable_push_is_reported() {
        let (client, binder) = setup();
        client.publish_config("timeout.txt", GROUP, "30").unwrap();
        binder.register_bindings(BeanBindings::new().field(ConfigBinding::new(
            "timeout",
            "timeout.txt",
            |s: &mut Service, v: i32| s.timeout = v,
        )));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert_eq!(svc.read().timeout, 30);

        assert!(client.publish_config("timeout.txt", GROUP, "sixty").is_err());
        assert_eq!(svc.read().timeout, 30);
        // a document that lacks the member's key is rejected the same way
        assert!(client.publish_config("timeout.txt", GROUP, "retries=3").is_err());
        assert_eq!(svc.read().timeout, 30);

        client.publish_config("timeout.txt", GROUP, "60").unwrap();
        assert_eq!(svc.read().timeout, 60);
    }

    /// Publishes `pending` right before the first binding listener subscribes.
    struct PushOnSubscribe {
        inner: Arc<MemoryConfigClient>,
        pending: parking_lot::Mutex<Option<String>>,
    }

    impl ConfigClient for PushOnSubscribe {
        fn name(&self) -> &str {
            "push-on-subscribe"
        }

        fn get_config(&self, document: &DocumentKey, timeout: Duration) -> Result<Option<String>> {
            self.inner.get_config(document, timeout)
        }

        fn add_listener(&self, document: &DocumentKey, listener: Arc<dyn ConfigListener>) -> Result<()> {
            if !listener.describe().starts_with("content cache") {
                if let Some(content) = self.pending.lock().take() {
                    self.inner
                        .publish_config(document.data_id(), document.group(), &content)?;
                }
            }
            self.inner.add_listener(document, listener)
        }
    }

    fn push_on_subscribe(initial: &str, pushed: &str) -> (Arc<MemoryConfigClient>, ConfigBinder) {
        let inner = Arc::new(MemoryConfigClient::new());
        inner.publish_config(DATA_ID, GROUP, initial).unwrap();
        let client = Arc::new(PushOnSubscribe {
            inner: Arc::clone(&inner),
            pending: parking_lot::Mutex::new(Some(pushed.to_string())),
        });
        let manager = ConfigManager::builder().with_client(client).build().unwrap();
        (inner, ConfigBinder::new(Arc::new(manager)))
    }

    #[test]
    fn test_push_while_subscribing_whole_document_field() {
        let (client, binder) = push_on_subscribe("timeout=30", "timeout=45");
        binder.register_bindings(BeanBindings::new().field(timeout_field()));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert_eq!(svc.read().timeout, 45);

        client.publish_config(DATA_ID, GROUP, "timeout=50").unwrap();
        assert_eq!(svc.read().timeout, 50);
    }

    #[test]
    fn test_push_while_subscribing_keyed_listener() {
        let (_client, binder) = push_on_subscribe("a.b=1", "a.b=2");
        binder.register_bindings(BeanBindings::new().listener(
            ListenerBinding::new("on_ab", DATA_ID, |s: &mut Service, v: String| s.calls.push(v)).key("a.b"),
        ));

        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert_eq!(svc.read().calls, vec!["2"]);
    }

    #[test]
    fn test_bean_without_bindings_is_untouched() {
        let (_client, binder) = setup();
        let svc = bean();
        binder.post_process_after_initialization(&svc, "svc").unwrap();
        assert!(binder.registry().is_empty());
        assert!(binder.cache().is_empty());
    }

    #[test]
    fn test_fetch_timeout_is_member_failure() {
        let client = Arc::new(MemoryConfigClient::new());
        client.set_fetch_delay(Some(std::time::Duration::from_secs(10)));
        let manager = ConfigManager::builder()
            .with_client(client)
            .with_timeout(std::time::Duration::from_millis(10))
            .build()
            .unwrap();
        let binder = ConfigBinder::new(Arc::new(manager));
        binder.register_bindings(BeanBindings::new().field(timeout_field()));

        let svc = bean();
        match binder.post_process_after_initialization(&svc, "svc") {
            Err(ConfigError::BeanBindingFailed { failures, .. }) => match &failures[0] {
                ConfigError::ConfigBindingError { source, .. } => {
                    assert!(matches!(**source, ConfigError::ConfigFetchTimeout { .. }));
                }
                other => panic!("unexpected failure {:?}", other),
            },
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(binder.registry().is_empty());
    }
}
