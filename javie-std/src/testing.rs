//! Testing utilities for Javie.
//!
//! This module provides doubles for the seams Javie talks to:
//!
//! - [`RecordingSink`]: a log sink that keeps every line it receives
//! - [`MockTransport`]: a transport that records requests and returns a canned response
//! - [`CallRecorder`]: builds dispatcher listeners that record their invocations

use crate::{
    dispatcher::Dispatcher,
    request::{RequestSpec, Transport, TransportResponse},
    sink::{Level, LogSink},
};
use javie_core::{BoxError, Value};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Sink
// ============================================================================

/// A sink that records all lines written to it.
///
/// # Example
///
/// ```rust
/// use javie_std::{logger::Loggers, testing::RecordingSink};
///
/// let sink = RecordingSink::new();
/// let loggers = Loggers::with_sink(sink.clone());
/// loggers.enable();
/// loggers.make(None).error("boom");
///
/// assert_eq!(sink.lines().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<(Level, Value)>>>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a clone of the recorded lines.
    pub fn lines(&self) -> Vec<(Level, Value)> {
        self.lines.lock().unwrap().clone()
    }

    /// Clear all recorded lines.
    pub fn clear(&self) {
        self.lines.lock().unwrap().clear();
    }
}

impl LogSink for RecordingSink {
    fn write(&self, level: &Level, payload: &Value) {
        self.lines
            .lock()
            .unwrap()
            .push((level.clone(), payload.clone()));
    }
}

// ============================================================================
// Mock Transport
// ============================================================================

/// A transport that records every request and answers with a fixed response.
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new(200, r#"{"ok":true}"#);
/// request.execute(&transport).await?;
/// assert_eq!(transport.requests().len(), 1);
/// ```
#[derive(Clone)]
pub struct MockTransport {
    requests: Arc<Mutex<Vec<RequestSpec>>>,
    response: Arc<Mutex<Result<TransportResponse, String>>>,
}

impl MockTransport {
    /// Answer every request with `status` and `body`.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(Ok(TransportResponse::new(status, body)))),
        }
    }

    /// Fail every request with `error`.
    pub fn failing(error: impl Into<String>) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            response: Arc::new(Mutex::new(Err(error.into()))),
        }
    }

    /// Change the response for subsequent requests.
    pub fn set_response(&self, status: u16, body: impl Into<String>) {
        *self.response.lock().unwrap() = Ok(TransportResponse::new(status, body));
    }

    /// Get recorded requests.
    pub fn requests(&self) -> Vec<RequestSpec> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<TransportResponse, BoxError> {
        self.requests.lock().unwrap().push(spec.clone());
        let response = self.response.lock().unwrap().clone();
        response.map_err(BoxError::from)
    }
}

// ============================================================================
// Call Recorder
// ============================================================================

/// Records listener invocations on a default [`Dispatcher`].
///
/// # Example
///
/// ```rust
/// use javie_std::{dispatcher::Dispatcher, testing::CallRecorder};
/// use serde_json::json;
///
/// let ev: Dispatcher = Dispatcher::new();
/// let recorder = CallRecorder::new();
/// ev.listen("saved", recorder.listener()).unwrap();
/// ev.fire("saved", &vec![json!(1)]).unwrap();
///
/// assert_eq!(recorder.calls(), vec![vec![json!(1)]]);
/// ```
#[derive(Clone, Default)]
pub struct CallRecorder {
    calls: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
}

impl CallRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records its arguments and returns null.
    pub fn listener(
        &self,
    ) -> impl Fn(&Dispatcher, &Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static {
        self.tagged("")
    }

    /// A listener that records `tag` along with its arguments and returns null.
    pub fn tagged(
        &self,
        tag: &str,
    ) -> impl Fn(&Dispatcher, &Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static {
        let calls = self.calls.clone();
        let tag = tag.to_string();
        move |_: &Dispatcher, args: &Vec<Value>| {
            calls.lock().unwrap().push((tag.clone(), args.clone()));
            Ok(Value::Null)
        }
    }

    /// Arguments of every recorded call, in order.
    pub fn calls(&self) -> Vec<Vec<Value>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, args)| args.clone())
            .collect()
    }

    /// Tags of every recorded call, in order.
    pub fn tags(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Number of recorded calls.
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}
