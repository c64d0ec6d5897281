//! Output sinks for the logger and profiler.

use javie_core::Value;
use std::fmt;

/// Severity of a log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    /// `error`
    Error,
    /// `warning`
    Warning,
    /// `info`
    Info,
    /// `debug`
    Debug,
    /// `log`, the plain unclassified level.
    Log,
    /// Any other label, rendered as `[LABEL]` by sinks.
    Custom(String),
}

impl Level {
    /// The lowercase label of this level.
    pub fn as_str(&self) -> &str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Info => "info",
            Level::Debug => "debug",
            Level::Log => "log",
            Level::Custom(label) => label,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Level {
    fn from(label: &str) -> Self {
        match label {
            "error" => Level::Error,
            "warning" => Level::Warning,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "log" => Level::Log,
            other => Level::Custom(other.to_string()),
        }
    }
}

/// Destination for formatted log output.
pub trait LogSink: Send + Sync + 'static {
    /// Write one line. `payload` is a single value or an array of values.
    fn write(&self, level: &Level, payload: &Value);
}

/// Render a payload the way sinks print it: bare strings, JSON for the rest.
pub fn render(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(" "),
        other => other.to_string(),
    }
}

/// A sink that forwards every line to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: &Level, payload: &Value) {
        let line = render(payload);
        match level {
            Level::Error => tracing::error!(target: "javie", "{line}"),
            Level::Warning => tracing::warn!(target: "javie", "{line}"),
            Level::Info => tracing::info!(target: "javie", "{line}"),
            Level::Debug => tracing::debug!(target: "javie", "{line}"),
            Level::Log => tracing::info!(target: "javie", "{line}"),
            Level::Custom(label) => {
                tracing::info!(target: "javie", "[{}] {line}", label.to_uppercase())
            }
        }
    }
}
