//! # javie - In-process utility toolkit
//!
//! `javie` bundles four small helpers behind one explicitly owned context:
//!
//! - a configuration and environment object ([`Javie`])
//! - a publish/subscribe event [`Dispatcher`]
//! - leveled [`Logger`]s and timing [`Profiler`]s, cached by name
//! - one-shot [`Request`]s executed through a caller-supplied [`Transport`]
//!
//! ## Quick Start
//!
//! ```rust
//! use javie::{Javie, Value};
//!
//! let javie = Javie::new();
//! let ev = javie.events();
//!
//! ev.listen("javie.ready", |_, args: &Vec<Value>| Ok(Value::from(args.len())))
//!     .unwrap();
//! let out = ev.fire("javie.ready", &vec![Value::from(1)]).unwrap();
//! assert_eq!(out, Some(vec![Value::from(1)]));
//!
//! let timer = javie.profiler().make(Some("boot"));
//! javie.profiler().enable();
//! timer.time(Some("init"), "Initialise");
//! assert!(timer.time_end(Some("init"), None).unwrap() >= 0.0);
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod context;

pub use context::{DEFAULT_ENV, Javie, JavieBuilder};

pub use javie_core::{
    // Errors
    BoxError,
    // Configuration
    Config,
    DEFAULT_NAME,
    DispatchError,
    // Named instances
    Instance,
    InstanceCache,
    JavieError,
    RequestError,
    Switch,
    Value,
    merge_defaults,
    normalize_name,
};

pub use javie_std::{
    dispatcher::{CloneTo, Dispatcher, Handle, Nullable},
    logger::{LogEntry, Logger, Loggers},
    profiler::{Profiler, Profilers, RecordKind, TimingRecord},
    request::{
        BEFORE_SEND, DynTransport, FormData, Method, ON_COMPLETE, ON_ERROR, Request,
        RequestSpec, Requests, Transport, TransportResponse, scoped,
    },
    sink::{Level, LogSink, TracingSink},
};

/// Testing utilities.
pub mod testing {
    pub use javie_std::testing::{CallRecorder, MockTransport, RecordingSink};
}

/// Prelude module - common imports for Javie.
///
/// # Usage
///
/// ```rust,ignore
/// use javie::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BoxError, Config, DispatchError, Dispatcher, FormData, Handle, Javie, JavieError, Level,
        LogSink, Logger, Profiler, Request, RequestError, Transport, Value,
    };
}
