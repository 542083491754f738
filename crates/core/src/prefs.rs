//! Preference storage and branch observation.
//!
//! Preferences are a host-owned key/value store with change notification.
//! The session layer consumes them through two views:
//!
//! - [`PrefBranch`] - typed reads of declared options under one branch prefix
//! - [`PreferenceChannel`] - push notification wiring a branch's changes to a
//!   single `refresh` callback
//!
//! Notification is per change, not batched; the refresh callback must be
//! idempotent and only read current values.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

/// Handle for a registered observer; pass to [`PrefStore::remove_observer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(u64);

struct ObserverEntry {
    id: u64,
    prefix: String,
    callback: Arc<dyn Fn(&str) + Send + Sync>,
}

struct StoreInner {
    values: Mutex<HashMap<String, Value>>,
    observers: Mutex<Vec<ObserverEntry>>,
    next_id: AtomicU64,
}

/// Shared key/value preference store with prefix-scoped change observers.
///
/// Clonable handle; all clones see the same values and observers.
#[derive(Clone)]
pub struct PrefStore {
    inner: Arc<StoreInner>,
}

impl PrefStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                values: Mutex::new(HashMap::new()),
                observers: Mutex::new(Vec::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Returns the current value for a key, if set.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.values.lock().get(key).cloned()
    }

    /// Sets a value and notifies observers whose prefix covers the key.
    ///
    /// Each change produces its own notification; no batching.
    pub fn set(&self, key: &str, value: Value) {
        self.inner.values.lock().insert(key.to_string(), value);

        let callbacks: Vec<Arc<dyn Fn(&str) + Send + Sync>> = self
            .inner
            .observers
            .lock()
            .iter()
            .filter(|entry| key.starts_with(&entry.prefix))
            .map(|entry| Arc::clone(&entry.callback))
            .collect();

        for callback in callbacks {
            callback(key);
        }
    }

    /// Registers an observer for any change under the given key prefix.
    pub fn add_observer(
        &self,
        prefix: impl Into<String>,
        callback: impl Fn(&str) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        self.inner.observers.lock().push(ObserverEntry {
            id,
            prefix: prefix.into(),
            callback: Arc::new(callback),
        });
        ObserverId(id)
    }

    /// Removes an observer. Idempotent: unknown ids are ignored.
    pub fn remove_observer(&self, id: ObserverId) {
        self.inner.observers.lock().retain(|entry| entry.id != id.0);
    }
}

impl Default for PrefStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed view of declared options under one branch prefix.
///
/// Reads go through a cache refreshed on demand; undeclared options fall back
/// to the store, declared ones to their default. The session core declares no
/// options of its own; hosts add them with [`declare`](Self::declare).
pub struct PrefBranch {
    store: PrefStore,
    branch: String,
    defaults: Mutex<HashMap<String, Value>>,
    cache: Mutex<HashMap<String, Value>>,
}

impl PrefBranch {
    /// Creates a branch view. `branch` is the key prefix, e.g. `"recorder."`.
    pub fn new(store: PrefStore, branch: impl Into<String>) -> Self {
        Self {
            store,
            branch: branch.into(),
            defaults: Mutex::new(HashMap::new()),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Declares an option under this branch with its default value.
    pub fn declare(&self, name: impl Into<String>, default: Value) {
        self.defaults.lock().insert(name.into(), default);
    }

    /// Returns the branch's key prefix.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Returns a handle to the backing store.
    pub fn store(&self) -> PrefStore {
        self.store.clone()
    }

    /// Returns the current value of an option, consulting the cache, then the
    /// store, then the declared default.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(cached) = self.cache.lock().get(name).cloned() {
            return Some(cached);
        }
        let key = format!("{}{}", self.branch, name);
        if let Some(value) = self.store.get(&key) {
            self.cache.lock().insert(name.to_string(), value.clone());
            return Some(value);
        }
        self.defaults.lock().get(name).cloned()
    }

    /// Drops cached values so subsequent reads see current store state.
    pub fn refresh(&self) {
        self.cache.lock().clear();
    }
}

/// Watches one preference branch and raises a refresh signal on any change
/// within it.
pub struct PreferenceChannel {
    store: PrefStore,
    branch: String,
    refresh: Arc<dyn Fn() + Send + Sync>,
    observer: Mutex<Option<ObserverId>>,
}

impl PreferenceChannel {
    /// Creates a channel wiring changes under `branch` to `refresh`.
    pub fn new(
        store: PrefStore,
        branch: impl Into<String>,
        refresh: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            store,
            branch: branch.into(),
            refresh: Arc::new(refresh),
            observer: Mutex::new(None),
        }
    }

    /// Begins observing the branch. A second call without an intervening
    /// [`unregister`](Self::unregister) is a no-op.
    pub fn register(&self) {
        let mut observer = self.observer.lock();
        if observer.is_some() {
            return;
        }
        let refresh = Arc::clone(&self.refresh);
        let id = self
            .store
            .add_observer(self.branch.clone(), move |_key| refresh());
        *observer = Some(id);
    }

    /// Stops observing. Safe to call even if never registered.
    pub fn unregister(&self) {
        if let Some(id) = self.observer.lock().take() {
            self.store.remove_observer(id);
        }
    }
}

impl Drop for PreferenceChannel {
    fn drop(&mut self) {
        self.unregister();
    }
}
