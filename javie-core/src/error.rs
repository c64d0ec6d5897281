//! Error types for Javie.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`JavieError`] - Top-level error type for all Javie operations
//! - [`DispatchError`] - Errors raised by the event dispatcher
//! - [`RequestError`] - Errors raised while building or executing a request

use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Javie operations.
#[derive(Error, Debug)]
pub enum JavieError {
    /// An error occurred in the event dispatcher.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// An error occurred while building or executing a request.
    #[error("request error: {0}")]
    Request(#[from] RequestError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors that can occur while registering, removing or firing listeners.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// An argument was missing or malformed (empty event id, empty handle id).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// No bucket is registered for the given event id.
    #[error("no registered event found for [{0}]")]
    NotFound(String),

    /// A listener failed; remaining listeners were not invoked.
    #[error("listener error")]
    Listener(#[source] BoxError),
}

/// Errors that can occur in the request wrapper.
#[derive(Error, Debug)]
pub enum RequestError {
    /// A required parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingParameter(String),

    /// The transport failed to deliver the request.
    #[error("transport error")]
    Transport(#[source] BoxError),

    /// A lifecycle listener failed.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

// Convenience conversions
impl From<BoxError> for JavieError {
    fn from(err: BoxError) -> Self {
        JavieError::Custom(err)
    }
}

impl From<BoxError> for DispatchError {
    fn from(err: BoxError) -> Self {
        DispatchError::Listener(err)
    }
}
