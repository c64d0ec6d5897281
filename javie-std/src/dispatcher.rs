//! Publish/subscribe event dispatcher.
//!
//! A [`Dispatcher`] maps event ids to ordered buckets of listeners. Listeners
//! run synchronously on the caller's thread, in registration order, and
//! receive the dispatcher itself as their invocation context.
//!
//! Dispatch iterates a snapshot of the bucket taken when the call starts, so a
//! listener may register, forget, or fire other listeners without affecting the
//! dispatch in progress.
//!
//! # Example
//!
//! ```rust
//! use javie_std::dispatcher::Dispatcher;
//! use serde_json::{Value, json};
//!
//! let ev: Dispatcher = Dispatcher::new();
//! ev.listen("javie.ready", |_, args: &Vec<Value>| Ok(json!(args.len()))).unwrap();
//!
//! let out = ev.fire("javie.ready", &vec![json!(1), json!(2)]).unwrap();
//! assert_eq!(out, Some(vec![json!(2)]));
//! ```

use javie_core::{BoxError, DispatchError, Value};
use std::{
    collections::HashMap,
    fmt,
    sync::{
        Arc, RwLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// The callable stored for each registration.
pub type ListenerFn<A, R> = dyn Fn(&Dispatcher<A, R>, &A) -> Result<R, BoxError> + Send + Sync;

/// Values that can be "null", used by [`Dispatcher::until`] to decide when to stop.
pub trait Nullable {
    /// Whether this value counts as null.
    fn is_null(&self) -> bool;
}

impl Nullable for Value {
    fn is_null(&self) -> bool {
        Value::is_null(self)
    }
}

impl<T> Nullable for Option<T> {
    fn is_null(&self) -> bool {
        self.is_none()
    }
}

impl Nullable for () {
    fn is_null(&self) -> bool {
        true
    }
}

/// Opaque token identifying one registration.
///
/// Returned by [`Dispatcher::listen`] and consumed by [`Dispatcher::forget`].
/// Registering the same callback twice yields two distinct handles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Handle {
    id: String,
    token: u64,
}

impl Handle {
    /// The event id this handle refers to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The same registration, addressed in another bucket.
    ///
    /// Buckets produced by [`Dispatcher::clone`] keep the registration tokens of
    /// their source, so a rebound handle can forget the copied entry.
    pub fn rebind(&self, id: impl Into<String>) -> Handle {
        Handle {
            id: id.into(),
            token: self.token,
        }
    }
}

struct Entry<A, R> {
    token: u64,
    callback: Arc<ListenerFn<A, R>>,
}

impl<A, R> Clone for Entry<A, R> {
    fn clone(&self) -> Self {
        Self {
            token: self.token,
            callback: Arc::clone(&self.callback),
        }
    }
}

/// An event dispatcher.
///
/// `A` is the argument type handed to every listener (a positional list of
/// JSON values by default) and `R` is each listener's return type.
pub struct Dispatcher<A = Vec<Value>, R = Value> {
    buckets: RwLock<HashMap<String, Vec<Entry<A, R>>>>,
    next_token: AtomicU64,
}

impl<A: 'static, R: 'static> Dispatcher<A, R> {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Register `callback` under `id`.
    pub fn listen<F>(&self, id: &str, callback: F) -> Result<Handle, DispatchError>
    where
        F: Fn(&Dispatcher<A, R>, &A) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        require_id(id)?;

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let entry = Entry {
            token,
            callback: Arc::new(callback),
        };

        self.buckets
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .entry(id.to_string())
            .or_default()
            .push(entry);

        tracing::trace!(event = %id, token, "Listener registered");

        Ok(Handle {
            id: id.to_string(),
            token,
        })
    }

    /// Register `callback` under `id`.
    #[deprecated(note = "use `listen`")]
    pub fn listener<F>(&self, id: &str, callback: F) -> Result<Handle, DispatchError>
    where
        F: Fn(&Dispatcher<A, R>, &A) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        self.listen(id, callback)
    }

    /// Invoke every listener registered under `id`.
    ///
    /// Returns `None` when `id` has no bucket, otherwise the return value of
    /// each listener in registration order. The first failing listener aborts
    /// the dispatch.
    pub fn fire(&self, id: &str, args: &A) -> Result<Option<Vec<R>>, DispatchError> {
        require_id(id)?;

        let Some(snapshot) = self.snapshot(id) else {
            return Ok(None);
        };

        tracing::trace!(event = %id, listeners = snapshot.len(), "Firing event");

        let mut responses = Vec::with_capacity(snapshot.len());
        for entry in &snapshot {
            responses.push(self.invoke(entry, args)?);
        }
        Ok(Some(responses))
    }

    /// Invoke only the first listener registered under `id`.
    pub fn first(&self, id: &str, args: &A) -> Result<Option<R>, DispatchError> {
        require_id(id)?;

        let Some(first) = self.snapshot(id).and_then(|bucket| bucket.into_iter().next()) else {
            return Ok(None);
        };

        self.invoke(&first, args).map(Some)
    }

    /// Invoke listeners in order until one returns a non-null value.
    ///
    /// The value that stopped the loop is not returned to the caller.
    pub fn until(&self, id: &str, args: &A) -> Result<(), DispatchError>
    where
        R: Nullable,
    {
        require_id(id)?;

        let Some(snapshot) = self.snapshot(id) else {
            return Ok(());
        };

        for entry in &snapshot {
            if !self.invoke(entry, args)?.is_null() {
                break;
            }
        }
        Ok(())
    }

    /// Remove every listener registered under `id`.
    pub fn flush(&self, id: &str) {
        let removed = self
            .buckets
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(id);

        if removed.is_some() {
            tracing::trace!(event = %id, "Event flushed");
        }
    }

    /// Remove the registration identified by `handle`.
    ///
    /// Forgetting a registration that is already gone is a no-op, but the
    /// bucket itself must exist.
    pub fn forget(&self, handle: &Handle) -> Result<(), DispatchError> {
        require_id(&handle.id)?;

        let mut buckets = self.buckets.write().unwrap_or_else(|p| p.into_inner());
        let bucket = buckets
            .get_mut(&handle.id)
            .ok_or_else(|| DispatchError::NotFound(handle.id.clone()))?;

        if let Some(index) = bucket.iter().position(|e| e.token == handle.token) {
            bucket.remove(index);
            tracing::trace!(event = %handle.id, token = handle.token, "Listener forgotten");
        }
        Ok(())
    }

    /// Start copying the bucket of `id` to another event id.
    ///
    /// ```rust
    /// # use javie_std::dispatcher::Dispatcher;
    /// # use serde_json::{Value, json};
    /// let ev: Dispatcher = Dispatcher::new();
    /// ev.listen("a", |_, _| Ok(json!("a"))).unwrap();
    /// ev.clone("a").to("b");
    /// assert_eq!(ev.fire("b", &vec![]).unwrap(), Some(vec![json!("a")]));
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn clone(&self, id: &str) -> CloneTo<'_, A, R> {
        CloneTo {
            dispatcher: self,
            source: id.to_string(),
        }
    }

    /// Whether a bucket exists for `id`.
    pub fn has_listeners(&self, id: &str) -> bool {
        self.buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .contains_key(id)
    }

    /// Number of listeners registered under `id`.
    pub fn listener_count(&self, id: &str) -> usize {
        self.buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .map_or(0, Vec::len)
    }

    /// All event ids that currently have a bucket, sorted.
    pub fn event_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }

    fn snapshot(&self, id: &str) -> Option<Vec<Entry<A, R>>> {
        self.buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(id)
            .cloned()
    }

    fn invoke(&self, entry: &Entry<A, R>, args: &A) -> Result<R, DispatchError> {
        (entry.callback)(self, args).map_err(DispatchError::Listener)
    }
}

impl<A: 'static, R: 'static> Default for Dispatcher<A, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, R> fmt::Debug for Dispatcher<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buckets = self.buckets.read().unwrap_or_else(|p| p.into_inner());
        let mut map = f.debug_map();
        for (id, bucket) in buckets.iter() {
            map.entry(id, &bucket.len());
        }
        map.finish()
    }
}

/// Pending copy of one bucket, completed by [`CloneTo::to`].
pub struct CloneTo<'a, A, R> {
    dispatcher: &'a Dispatcher<A, R>,
    source: String,
}

impl<A: 'static, R: 'static> CloneTo<'_, A, R> {
    /// Replace the bucket of `target` with a copy of the source bucket.
    ///
    /// When the source has no bucket, `target` ends up without one too.
    pub fn to(self, target: &str) {
        let mut buckets = self
            .dispatcher
            .buckets
            .write()
            .unwrap_or_else(|p| p.into_inner());

        match buckets.get(&self.source).cloned() {
            Some(copy) => {
                buckets.insert(target.to_string(), copy);
            }
            None => {
                buckets.remove(target);
            }
        }

        tracing::trace!(from = %self.source, to = %target, "Event cloned");
    }
}

fn require_id(id: &str) -> Result<(), DispatchError> {
    if id.is_empty() {
        return Err(DispatchError::InvalidArgument(format!(
            "Event ID is not provided: [{id}]"
        )));
    }
    Ok(())
}
