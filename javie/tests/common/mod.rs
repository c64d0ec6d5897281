#![allow(dead_code)]

use javie::{BoxError, Dispatcher, Javie, Value, testing::RecordingSink};
use std::sync::{Arc, Mutex};

// ============================================================================
// Fixtures
// ============================================================================

/// A context whose logger and profiler write into the returned sink.
pub fn recorded_javie() -> (Javie, RecordingSink) {
    let sink = RecordingSink::new();
    let javie = Javie::builder().sink(sink.clone()).build();
    (javie, sink)
}

pub fn no_args() -> Vec<Value> {
    Vec::new()
}

// ============================================================================
// Listeners
// ============================================================================

/// A listener that appends `id` to `order` and returns `id`.
pub fn order_recording(
    id: i64,
    order: Arc<Mutex<Vec<i64>>>,
) -> impl Fn(&Dispatcher, &Vec<Value>) -> Result<Value, BoxError> + Send + Sync + 'static {
    move |_: &Dispatcher, _: &Vec<Value>| {
        order.lock().unwrap().push(id);
        Ok(Value::from(id))
    }
}
