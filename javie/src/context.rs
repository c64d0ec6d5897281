//! The `Javie` context: configuration, environment and the owned modules.

use javie_core::{Config, Value};
use javie_std::{
    dispatcher::Dispatcher,
    logger::Loggers,
    profiler::Profilers,
    request::Requests,
    sink::{LogSink, TracingSink},
};
use std::sync::{Arc, RwLock};

/// Environment a context runs in unless told otherwise.
pub const DEFAULT_ENV: &str = "production";

/// Process-level context owning every Javie module.
///
/// Construct one at startup and pass it to the code that needs it.
///
/// # Example
///
/// ```rust
/// use javie::Javie;
///
/// let javie = Javie::builder().env("development").build();
/// javie.put("baseUrl", "http://foobar.com");
///
/// javie.run(Some("development"), |j| {
///     j.logger().make(None).info("booted");
/// });
/// assert_eq!(javie.get("baseUrl"), Some("http://foobar.com".into()));
/// ```
pub struct Javie {
    env: String,
    config: RwLock<Config>,
    events: Arc<Dispatcher>,
    logger: Loggers,
    profiler: Profilers,
    request: Requests,
}

impl Javie {
    /// Create a context for the `production` environment writing to `tracing`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a context.
    pub fn builder() -> JavieBuilder {
        JavieBuilder::new()
    }

    /// The current environment name.
    pub fn env(&self) -> &str {
        &self.env
    }

    /// Run `f` if `env` is `None` or matches the current environment.
    ///
    /// Returns whether `f` ran.
    pub fn run<F>(&self, env: Option<&str>, f: F) -> bool
    where
        F: FnOnce(&Javie),
    {
        match env {
            Some(env) if env != self.env => false,
            _ => {
                f(self);
                true
            }
        }
    }

    /// Set one configuration key.
    pub fn put(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.config
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .set_one(key, value);
    }

    /// Set several configuration keys.
    pub fn put_many<K, V, I>(&self, pairs: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.config
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .set_many(pairs);
    }

    /// Read a configuration key.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.config
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(key)
            .cloned()
    }

    /// Read a configuration key with a fallback.
    pub fn get_or(&self, key: &str, default: impl Into<Value>) -> Value {
        self.get(key).unwrap_or_else(|| default.into())
    }

    /// Snapshot of the whole configuration.
    pub fn config(&self) -> Config {
        self.config.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// The shared event dispatcher.
    pub fn events(&self) -> &Dispatcher {
        &self.events
    }

    /// The logger module.
    pub fn logger(&self) -> &Loggers {
        &self.logger
    }

    /// The profiler module.
    pub fn profiler(&self) -> &Profilers {
        &self.profiler
    }

    /// The request module.
    pub fn request(&self) -> &Requests {
        &self.request
    }
}

impl Default for Javie {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Javie`].
///
/// # Example
/// ```ignore
/// let javie = Javie::builder()
///     .env("staging")
///     .sink(RecordingSink::new())
///     .put("baseUrl", "http://foobar.com")
///     .build();
/// ```
pub struct JavieBuilder {
    env: String,
    sink: Arc<dyn LogSink>,
    config: Config,
}

impl JavieBuilder {
    /// Create a builder with the defaults of [`Javie::new`].
    pub fn new() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            sink: Arc::new(TracingSink),
            config: Config::new(),
        }
    }

    /// Set the environment name.
    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = env.into();
        self
    }

    /// Send logger and profiler output to `sink`.
    pub fn sink(mut self, sink: impl LogSink) -> Self {
        self.sink = Arc::new(sink);
        self
    }

    /// Seed one configuration key.
    pub fn put(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.config.set_one(key, value);
        self
    }

    /// Build the context.
    pub fn build(self) -> Javie {
        let events = Arc::new(Dispatcher::new());

        #[cfg(feature = "tracing")]
        tracing::debug!(env = %self.env, keys = self.config.len(), "Javie context initialised");

        Javie {
            env: self.env,
            config: RwLock::new(self.config),
            request: Requests::new(Arc::clone(&events)),
            events,
            logger: Loggers::with_shared_sink(Arc::clone(&self.sink)),
            profiler: Profilers::with_shared_sink(self.sink),
        }
    }
}

impl Default for JavieBuilder {
    fn default() -> Self {
        Self::new()
    }
}
