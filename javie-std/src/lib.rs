//! # javie-std
//!
//! Standard modules for the Javie utility toolkit.
//!
//! This crate provides:
//! - **Event dispatch**: [`Dispatcher`] with listen/fire/first/until/flush/forget/clone
//! - **Logging**: [`Loggers`] and named [`Logger`] instances writing to a [`LogSink`]
//! - **Profiling**: [`Profilers`] and named [`Profiler`] timers
//! - **Requests**: [`Requests`] and one-shot [`Request`]s executed through a [`Transport`]
//! - **Testing**: recording sinks, mock transports and listener recorders
//!
//! [`Dispatcher`]: dispatcher::Dispatcher
//! [`Loggers`]: logger::Loggers
//! [`Logger`]: logger::Logger
//! [`LogSink`]: sink::LogSink
//! [`Profilers`]: profiler::Profilers
//! [`Profiler`]: profiler::Profiler
//! [`Requests`]: request::Requests
//! [`Request`]: request::Request
//! [`Transport`]: request::Transport

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use javie_core;

// Modules
pub mod dispatcher;
pub mod logger;
pub mod profiler;
pub mod request;
pub mod sink;
pub mod testing;
