//! Leveled logger with named instances.
//!
//! Every call is kept in the instance's log history. Lines only reach the
//! [`LogSink`] while the owning [`Loggers`] module is enabled, which it is not
//! by default.
//!
//! ```rust
//! use javie_std::logger::Loggers;
//!
//! let loggers = Loggers::new();
//! loggers.enable();
//!
//! let log = loggers.make(None);
//! log.info("ready").debug("details");
//! assert_eq!(log.logs().len(), 2);
//! ```

use crate::sink::{Level, LogSink, TracingSink};
use javie_core::{Config, Instance, InstanceCache, Switch, Value};
use std::sync::{Arc, Mutex};

/// One recorded log call.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Level the call was made at.
    pub level: Level,
    /// Arguments as passed.
    pub args: Vec<Value>,
}

/// A named logger.
pub struct Logger {
    name: String,
    config: Config,
    enabled: Switch,
    sink: Arc<dyn LogSink>,
    logs: Mutex<Vec<LogEntry>>,
}

impl Instance for Logger {}

impl Logger {
    /// Log at `info`.
    pub fn info(&self, message: impl Into<Value>) -> &Self {
        self.post(Level::Info, vec![message.into()])
    }

    /// Log at `debug`.
    pub fn debug(&self, message: impl Into<Value>) -> &Self {
        self.post(Level::Debug, vec![message.into()])
    }

    /// Log at `warning`.
    pub fn warning(&self, message: impl Into<Value>) -> &Self {
        self.post(Level::Warning, vec![message.into()])
    }

    /// Log at `error`.
    pub fn error(&self, message: impl Into<Value>) -> &Self {
        self.post(Level::Error, vec![message.into()])
    }

    /// Log at the plain `log` level.
    pub fn log(&self, message: impl Into<Value>) -> &Self {
        self.post(Level::Log, vec![message.into()])
    }

    /// Log `args` at an arbitrary level.
    pub fn post(&self, level: impl Into<Level>, args: Vec<Value>) -> &Self {
        let level = level.into();

        if self.enabled.is_enabled() {
            let payload = match args.as_slice() {
                [single] => single.clone(),
                _ => Value::Array(args.clone()),
            };
            self.sink.write(&level, &payload);
        }

        self.logs
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(LogEntry { level, args });
        self
    }

    /// Recorded log history, oldest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// The logger module: enabled flag, sink, and named instances.
pub struct Loggers {
    enabled: Switch,
    sink: Arc<dyn LogSink>,
    cache: InstanceCache<Logger>,
}

impl Loggers {
    /// Create a disabled logger module writing to [`TracingSink`].
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }

    /// Create a disabled logger module writing to `sink`.
    pub fn with_sink(sink: impl LogSink) -> Self {
        Self::with_shared_sink(Arc::new(sink))
    }

    /// Create a disabled logger module writing to an already shared sink.
    pub fn with_shared_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            enabled: Switch::default(),
            sink,
            cache: InstanceCache::default(),
        }
    }

    /// Allow loggers to write to the sink.
    pub fn enable(&self) {
        self.enabled.enable();
    }

    /// Stop loggers from writing to the sink.
    pub fn disable(&self) {
        self.enabled.disable();
    }

    /// Whether loggers currently write to the sink.
    pub fn status(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Get or build the logger named `name`.
    pub fn make(&self, name: Option<&str>) -> Arc<Logger> {
        self.cache.make(name, |name, config| Logger {
            name: name.to_string(),
            config,
            enabled: self.enabled.clone(),
            sink: Arc::clone(&self.sink),
            logs: Mutex::new(Vec::new()),
        })
    }

    /// The underlying instance cache (module configuration lives here).
    pub fn instances(&self) -> &InstanceCache<Logger> {
        &self.cache
    }
}

impl Default for Loggers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use serde_json::json;

    #[test]
    fn test_disabled_logger_records_but_does_not_write() {
        let sink = RecordingSink::new();
        let loggers = Loggers::with_sink(sink.clone());
        assert!(!loggers.status());

        loggers.make(None).info("quiet");

        assert_eq!(loggers.make(None).logs().len(), 1);
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn test_enabled_logger_writes_each_level() {
        let sink = RecordingSink::new();
        let loggers = Loggers::with_sink(sink.clone());
        loggers.enable();

        loggers
            .make(Some("app"))
            .info("i")
            .debug("d")
            .warning("w")
            .error("e")
            .log("l");

        let levels: Vec<Level> = sink.lines().into_iter().map(|(level, _)| level).collect();
        assert_eq!(
            levels,
            vec![Level::Info, Level::Debug, Level::Warning, Level::Error, Level::Log]
        );
    }

    #[test]
    fn test_post_with_several_args_writes_an_array() {
        let sink = RecordingSink::new();
        let loggers = Loggers::with_sink(sink.clone());
        loggers.enable();

        let log = loggers.make(None);
        log.post("audit", vec![json!("user"), json!(42)]);

        assert_eq!(
            sink.lines(),
            vec![(Level::Custom("audit".into()), json!(["user", 42]))]
        );
        assert_eq!(log.logs()[0].args, vec![json!("user"), json!(42)]);
    }

    #[test]
    fn test_switch_is_shared_with_existing_instances() {
        let sink = RecordingSink::new();
        let loggers = Loggers::with_sink(sink.clone());
        let log = loggers.make(Some("early"));

        loggers.enable();
        log.info("now visible");
        loggers.disable();
        log.info("hidden again");

        assert_eq!(sink.lines().len(), 1);
        assert_eq!(log.logs().len(), 2);
    }

    #[test]
    fn test_named_instances_keep_separate_history() {
        let loggers = Loggers::new();
        loggers.make(Some("a")).info("1");
        loggers.make(Some("b")).info("2").info("3");

        assert_eq!(loggers.make(Some("a")).logs().len(), 1);
        assert_eq!(loggers.make(Some("b")).logs().len(), 2);
        assert!(Arc::ptr_eq(&loggers.make(Some("a")), &loggers.make(Some("a"))));
    }
}
