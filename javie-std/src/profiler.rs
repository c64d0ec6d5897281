//! Named timing profilers.
//!
//! Each [`Profiler`] keeps an ordered list of [`TimingRecord`]s. A record is
//! addressed by its id, so calling [`Profiler::time`] or [`Profiler::time_end`]
//! again for the same id updates the existing record instead of appending.
//!
//! Like the logger, profilers do nothing until their module is enabled.

use crate::sink::{Level, LogSink, TracingSink};
use javie_core::{Config, Instance, InstanceCache, Switch, Value};
use std::{
    backtrace::Backtrace,
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Instant,
};

/// Kind of a profiler record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RecordKind {
    /// A start/end timing pair.
    Time,
}

/// One timing record.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingRecord {
    /// Record id.
    pub id: String,
    /// Record kind.
    pub kind: RecordKind,
    /// When timing started.
    pub start: Instant,
    /// When timing last ended.
    pub end: Option<Instant>,
    /// `end - start` in seconds, once ended.
    pub total: Option<f64>,
    /// Free-form description.
    pub message: String,
}

impl TimingRecord {
    fn new(id: String, start: Instant, message: String) -> Self {
        Self {
            id,
            kind: RecordKind::Time,
            start,
            end: None,
            total: None,
            message,
        }
    }

    /// Render as `"{id}: {message} - {ms}ms"`.
    pub fn summary(&self) -> String {
        let ms = (self.total.unwrap_or(0.0) * 1000.0).floor();
        format!("{}: {} - {}ms", self.id, self.message, ms)
    }
}

#[derive(Default)]
struct Timeline {
    records: Vec<TimingRecord>,
    index: HashMap<String, usize>,
}

impl Timeline {
    fn resolve_id(&self, id: Option<&str>) -> String {
        id.map_or_else(|| self.records.len().to_string(), str::to_string)
    }

    fn key(id: &str) -> String {
        format!("time.{id}")
    }
}

/// A named profiler.
pub struct Profiler {
    name: String,
    config: Config,
    enabled: Switch,
    sink: Arc<dyn LogSink>,
    started_at: Instant,
    timeline: Mutex<Timeline>,
}

impl Instance for Profiler {}

impl Profiler {
    /// Start timing `id`, returning the id used.
    ///
    /// Without an id, the current record count is used. Returns `None` while
    /// the module is disabled.
    pub fn time(&self, id: Option<&str>, message: impl Into<String>) -> Option<String> {
        let mut timeline = self.timeline.lock().unwrap_or_else(|p| p.into_inner());
        let id = timeline.resolve_id(id);

        if !self.enabled.is_enabled() {
            return None;
        }

        let record = TimingRecord::new(id.clone(), Instant::now(), message.into());
        let key = Timeline::key(&id);

        let existing = timeline.index.get(&key).copied();
        match existing {
            Some(position) => timeline.records[position] = record,
            None => {
                timeline.records.push(record);
                let position = timeline.records.len() - 1;
                timeline.index.insert(key, position);
            }
        }

        tracing::trace!(profiler = %self.name, id = %id, "Timer started");
        Some(id)
    }

    /// Stop timing `id`, returning the elapsed seconds.
    ///
    /// If `id` was never started, timing is measured from the profiler's
    /// construction. Returns `None` while the module is disabled.
    pub fn time_end(&self, id: Option<&str>, message: Option<&str>) -> Option<f64> {
        let mut timeline = self.timeline.lock().unwrap_or_else(|p| p.into_inner());
        let id = timeline.resolve_id(id);

        if !self.enabled.is_enabled() {
            return None;
        }

        let key = Timeline::key(&id);
        let existing = timeline.index.get(&key).copied();
        let position = match existing {
            Some(position) => position,
            None => {
                let message = message.unwrap_or_default().to_string();
                timeline
                    .records
                    .push(TimingRecord::new(id.clone(), self.started_at, message));
                let position = timeline.records.len() - 1;
                timeline.index.insert(key, position);
                position
            }
        };

        let record = &mut timeline.records[position];
        let end = Instant::now();
        let total = end.saturating_duration_since(record.start).as_secs_f64();
        record.end = Some(end);
        record.total = Some(total);

        tracing::trace!(profiler = %self.name, id = %id, total, "Timer ended");
        Some(total)
    }

    /// Write the current backtrace to the sink at debug level.
    pub fn trace(&self) {
        if !self.enabled.is_enabled() {
            return;
        }
        let backtrace = Backtrace::force_capture().to_string();
        self.sink.write(&Level::Debug, &Value::String(backtrace));
    }

    /// Write every record to the sink and return the rendered lines.
    ///
    /// While disabled this returns `None`, unless `auto_enable` is set, in
    /// which case the module is enabled first.
    pub fn output(&self, auto_enable: bool) -> Option<Vec<String>> {
        if !self.enabled.is_enabled() {
            if !auto_enable {
                return None;
            }
            self.enabled.enable();
        }

        let lines: Vec<String> = self
            .records()
            .iter()
            .map(|record| match record.kind {
                RecordKind::Time => record.summary(),
            })
            .collect();

        for line in &lines {
            self.sink.write(&Level::Info, &Value::String(line.clone()));
        }
        Some(lines)
    }

    /// Snapshot of all records, in creation order.
    pub fn records(&self) -> Vec<TimingRecord> {
        self.timeline
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .records
            .clone()
    }

    /// When this profiler was constructed.
    pub fn started_at(&self) -> Instant {
        self.started_at
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

/// The profiler module: enabled flag, sink, and named instances.
pub struct Profilers {
    enabled: Switch,
    sink: Arc<dyn LogSink>,
    cache: InstanceCache<Profiler>,
}

impl Profilers {
    /// Create a disabled profiler module writing to [`TracingSink`].
    pub fn new() -> Self {
        Self::with_sink(TracingSink)
    }

    /// Create a disabled profiler module writing to `sink`.
    pub fn with_sink(sink: impl LogSink) -> Self {
        Self::with_shared_sink(Arc::new(sink))
    }

    /// Create a disabled profiler module writing to an already shared sink.
    pub fn with_shared_sink(sink: Arc<dyn LogSink>) -> Self {
        Self {
            enabled: Switch::default(),
            sink,
            cache: InstanceCache::default(),
        }
    }

    /// Enable profiling.
    pub fn enable(&self) {
        self.enabled.enable();
    }

    /// Disable profiling.
    pub fn disable(&self) {
        self.enabled.disable();
    }

    /// Whether profiling is enabled.
    pub fn status(&self) -> bool {
        self.enabled.is_enabled()
    }

    /// Get or build the profiler named `name`.
    pub fn make(&self, name: Option<&str>) -> Arc<Profiler> {
        self.cache.make(name, |name, config| Profiler {
            name: name.to_string(),
            config,
            enabled: self.enabled.clone(),
            sink: Arc::clone(&self.sink),
            started_at: Instant::now(),
            timeline: Mutex::new(Timeline::default()),
        })
    }

    /// The underlying instance cache.
    pub fn instances(&self) -> &InstanceCache<Profiler> {
        &self.cache
    }
}

impl Default for Profilers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingSink;
    use std::{thread, time::Duration};

    fn enabled() -> (Profilers, RecordingSink) {
        let sink = RecordingSink::new();
        let profilers = Profilers::with_sink(sink.clone());
        profilers.enable();
        (profilers, sink)
    }

    #[test]
    fn test_disabled_profiler_records_nothing() {
        let profilers = Profilers::new();
        let p = profilers.make(None);

        assert_eq!(p.time(Some("t1"), "load"), None);
        assert_eq!(p.time_end(Some("t1"), None), None);
        assert!(p.records().is_empty());
        assert_eq!(p.output(false), None);
    }

    #[test]
    fn test_repeated_time_end_updates_one_record() {
        let (profilers, _) = enabled();
        let p = profilers.make(None);

        assert_eq!(p.time(Some("t1"), "load").as_deref(), Some("t1"));
        let first = p.time_end(Some("t1"), None).unwrap();
        thread::sleep(Duration::from_millis(2));
        let second = p.time_end(Some("t1"), None).unwrap();

        let records = p.records();
        assert_eq!(records.len(), 1);
        assert!(first >= 0.0);
        assert!(second >= first);
        assert_eq!(records[0].total, Some(second));
        assert_eq!(records[0].message, "load");
    }

    #[test]
    fn test_restarting_a_timer_replaces_it_in_place() {
        let (profilers, _) = enabled();
        let p = profilers.make(None);

        p.time(Some("a"), "first");
        p.time(Some("b"), "other");
        p.time(Some("a"), "again");

        let records = p.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "a");
        assert_eq!(records[0].message, "again");
        assert_eq!(records[0].end, None);
    }

    #[test]
    fn test_time_end_without_start_uses_construction_time() {
        let (profilers, _) = enabled();
        let p = profilers.make(Some("implicit"));

        let total = p.time_end(Some("boot"), Some("since start")).unwrap();
        let record = &p.records()[0];

        assert_eq!(record.start, p.started_at());
        assert_eq!(record.message, "since start");
        assert!(total >= 0.0);
    }

    #[test]
    fn test_missing_id_uses_record_count() {
        let (profilers, _) = enabled();
        let p = profilers.make(None);

        assert_eq!(p.time(None, "zero").as_deref(), Some("0"));
        assert_eq!(p.time(None, "one").as_deref(), Some("1"));
    }

    #[test]
    fn test_output_writes_one_line_per_record() {
        let (profilers, sink) = enabled();
        let p = profilers.make(None);
        p.time(Some("page.load"), "Load page");
        p.time_end(Some("page.load"), None);

        let lines = p.output(false).unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("page.load: Load page - "));
        assert!(lines[0].ends_with("ms"));
        assert_eq!(sink.lines().len(), 1);
    }

    #[test]
    fn test_output_can_enable_the_module() {
        let profilers = Profilers::with_sink(RecordingSink::new());
        let p = profilers.make(None);

        assert_eq!(p.output(true), Some(vec![]));
        assert!(profilers.status());
    }

    #[test]
    fn test_trace_writes_a_debug_line_when_enabled() {
        let (profilers, sink) = enabled();
        profilers.make(None).trace();
        profilers.disable();
        profilers.make(None).trace();

        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, Level::Debug);
    }

    #[test]
    fn test_summary_floors_milliseconds() {
        let mut record = TimingRecord::new("x".into(), Instant::now(), "msg".into());
        assert_eq!(record.summary(), "x: msg - 0ms");
        record.total = Some(0.0129);
        assert_eq!(record.summary(), "x: msg - 12ms");
    }
}
