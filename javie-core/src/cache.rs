//! Named-instance cache.
//!
//! An [`InstanceCache`] hands out one shared instance per name. The first call
//! to [`make`](InstanceCache::make) for a name builds the instance with a
//! configuration seeded from [`Instance::defaults`] merged over the cache's
//! module configuration; every later call returns the same `Arc`.
//!
//! # Example
//!
//! ```rust
//! use javie_core::{Config, Instance, InstanceCache};
//! use std::sync::Arc;
//!
//! struct Counter {
//!     name: String,
//!     config: Config,
//! }
//!
//! impl Instance for Counter {}
//!
//! let cache = InstanceCache::<Counter>::new(Config::from_pairs([("step", 1)]));
//! let a = cache.make(Some("hits"), |name, config| Counter { name: name.into(), config });
//! let b = cache.make(Some("hits"), |name, config| Counter { name: name.into(), config });
//!
//! assert!(Arc::ptr_eq(&a, &b));
//! assert_eq!(a.config.get("step"), Some(&1.into()));
//! ```

use crate::config::Config;
use serde_json::Value;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, RwLock},
};

/// Name used when the caller does not supply one.
pub const DEFAULT_NAME: &str = "default";

/// Normalize an optional instance name, mapping `None` and `""` to [`DEFAULT_NAME`].
pub fn normalize_name(name: Option<&str>) -> &str {
    match name {
        Some(name) if !name.is_empty() => name,
        _ => DEFAULT_NAME,
    }
}

/// A type that can be stored in an [`InstanceCache`].
pub trait Instance: Send + Sync + 'static {
    /// Instance-level configuration defaults.
    ///
    /// These win over the module configuration when a new instance is built.
    fn defaults() -> Config {
        Config::new()
    }
}

/// A lazily populated cache of named, shared instances.
pub struct InstanceCache<T: Instance> {
    config: Arc<RwLock<Config>>,
    instances: Mutex<HashMap<String, Arc<T>>>,
}

impl<T: Instance> InstanceCache<T> {
    /// Create a cache with the given module configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Return the instance for `name`, building it on first use.
    ///
    /// `build` receives the normalized name and the seeded configuration. It is
    /// called outside the cache lock, so it may itself use the cache; if two
    /// callers race, the first stored instance wins and is returned to both.
    pub fn make<F>(&self, name: Option<&str>, build: F) -> Arc<T>
    where
        F: FnOnce(&str, Config) -> T,
    {
        let name = normalize_name(name);

        if let Some(existing) = self.get(Some(name)) {
            return existing;
        }

        let config = T::defaults().with_defaults(&self.config());
        let built = Arc::new(build(name, config));

        #[cfg(feature = "tracing")]
        tracing::debug!(instance = %name, kind = %std::any::type_name::<T>(), "Constructed named instance");

        let mut guard = self.instances.lock().unwrap_or_else(|p| p.into_inner());
        guard.entry(name.to_string()).or_insert(built).clone()
    }

    /// Look up an existing instance without building one.
    pub fn get(&self, name: Option<&str>) -> Option<Arc<T>> {
        let guard = self.instances.lock().unwrap_or_else(|p| p.into_inner());
        guard.get(normalize_name(name)).cloned()
    }

    /// Check whether an instance exists for `name`.
    pub fn contains(&self, name: Option<&str>) -> bool {
        let guard = self.instances.lock().unwrap_or_else(|p| p.into_inner());
        guard.contains_key(normalize_name(name))
    }

    /// Names of all constructed instances, sorted.
    pub fn names(&self) -> Vec<String> {
        let guard = self.instances.lock().unwrap_or_else(|p| p.into_inner());
        let mut names: Vec<String> = guard.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of constructed instances.
    pub fn len(&self) -> usize {
        self.instances.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Check whether no instance has been constructed yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the module configuration.
    pub fn config(&self) -> Config {
        self.config.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// The live module configuration, for instances that must read settings
    /// changed after they were built.
    pub fn shared_config(&self) -> Arc<RwLock<Config>> {
        Arc::clone(&self.config)
    }

    /// Set one module configuration key.
    ///
    /// Only instances built afterwards see the change.
    pub fn set_one(&self, key: impl Into<String>, value: impl Into<Value>) {
        let mut guard = self.config.write().unwrap_or_else(|p| p.into_inner());
        guard.set_one(key, value);
    }

    /// Set several module configuration keys.
    pub fn set_many<K, V, I>(&self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut guard = self.config.write().unwrap_or_else(|p| p.into_inner());
        guard.set_many(pairs);
    }

    /// Read a module configuration key.
    pub fn value(&self, key: &str) -> Option<Value> {
        self.config
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    /// Read a module configuration key with a fallback.
    pub fn value_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.value(key).unwrap_or_else(|| default.into())
    }
}

impl<T: Instance> Default for InstanceCache<T> {
    fn default() -> Self {
        Self::new(Config::new())
    }
}
