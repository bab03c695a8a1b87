//! Per-invocation command context.
//!
//! A [`CommandContext`] is built by the host for every predicate evaluation and
//! every execution. It bundles:
//!
//! - an opaque host reference (downcast with [`CommandContext::host`])
//! - [`SharedState`]: a mutable JSON-valued mapping shared by all commands
//! - [`Services`]: named, dynamically typed services shared by all commands
//! - `extra`: call-specific values owned by this context alone
//!
//! The core makes no contract about what the host puts in `state`, `services`,
//! or `extra`. Structure and validation belong to the host.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

/// A JSON value stored in state or extras.
pub type Value = serde_json::Value;

/// A string-keyed mapping of JSON values.
pub type StateMap = serde_json::Map<String, Value>;

/// A dynamically typed service or host handle.
pub type AnyArc = Arc<dyn Any + Send + Sync>;

// =============================================================================
// Shared State
// =============================================================================

/// Mutable state shared by reference across all contexts built by one host.
///
/// Cloning a `SharedState` yields another handle to the same mapping.
#[derive(Clone, Default)]
pub struct SharedState {
    inner: Arc<RwLock<StateMap>>,
}

impl SharedState {
    /// Create an empty state mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.read().get(key).cloned()
    }

    /// Get the value under `key` if it is a string.
    pub fn get_str(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// Store a value, returning the previous one.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.write().insert(key.into(), value.into())
    }

    /// Remove a value, returning it.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.write().remove(key)
    }

    /// Check whether a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().contains_key(key)
    }

    /// Copy the whole mapping.
    pub fn snapshot(&self) -> StateMap {
        self.inner.read().clone()
    }

    /// Check whether two handles point at the same mapping.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SharedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedState").field(&*self.inner.read()).finish()
    }
}

// =============================================================================
// Services
// =============================================================================

/// Named services shared by reference across all contexts built by one host.
///
/// Services are stored type-erased and recovered with [`Services::get`].
#[derive(Clone, Default)]
pub struct Services {
    inner: Arc<RwLock<IndexMap<String, AnyArc>>>,
}

impl Services {
    /// Create an empty service table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service under a name, replacing any previous one.
    pub fn insert<T: Any + Send + Sync>(&self, name: impl Into<String>, service: Arc<T>) {
        self.inner.write().insert(name.into(), service);
    }

    /// Get a service by name, if it exists and has type `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let service = self.inner.read().get(name).cloned()?;
        service.downcast::<T>().ok()
    }

    /// Remove a service by name.
    pub fn remove(&self, name: &str) -> bool {
        self.inner.write().shift_remove(name).is_some()
    }

    /// Check whether a service is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.read().contains_key(name)
    }

    /// Registered service names, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.inner.read().keys().cloned().collect()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.read().keys()).finish()
    }
}

// =============================================================================
// Command Context
// =============================================================================

/// The bundle passed to every command handler and predicate.
///
/// Contexts are cheap to build: `state` and `services` are shared handles and
/// only `extra` is owned.
///
/// ```ignore
/// let ctx = CommandContext::new()
///     .with_host(host.clone())
///     .with_state(state.clone())
///     .with_extra("source", "menu");
/// ```
#[derive(Clone, Default)]
pub struct CommandContext {
    host: Option<AnyArc>,
    state: SharedState,
    services: Services,
    extra: StateMap,
}

impl CommandContext {
    /// Create a context with no host, fresh state, no services and no extras.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host reference.
    pub fn with_host<T: Any + Send + Sync>(mut self, host: Arc<T>) -> Self {
        self.host = Some(host);
        self
    }

    /// Set the host reference from an already type-erased handle.
    pub fn with_host_any(mut self, host: AnyArc) -> Self {
        self.host = Some(host);
        self
    }

    /// Use the given shared state.
    pub fn with_state(mut self, state: SharedState) -> Self {
        self.state = state;
        self
    }

    /// Use the given service table.
    pub fn with_services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    /// Add one call-specific extra value.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Replace the call-specific extras.
    pub fn with_extras(mut self, extra: StateMap) -> Self {
        self.extra = extra;
        self
    }

    /// Get the host as a concrete type.
    pub fn host<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.host.as_deref()?.downcast_ref::<T>()
    }

    /// Check whether a host reference is present.
    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    /// The shared state.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// The shared service table.
    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Shorthand for `services().get::<T>(name)`.
    pub fn service<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.services.get(name)
    }

    /// All call-specific extras.
    pub fn extras(&self) -> &StateMap {
        &self.extra
    }

    /// One call-specific extra value.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("has_host", &self.host.is_some())
            .field("state", &self.state)
            .field("services", &self.services)
            .field("extra", &self.extra)
            .finish()
    }
}

static_assertions::assert_impl_all!(CommandContext: Send, Sync);
