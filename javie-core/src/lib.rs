//! # javie-core
//!
//! Core types for the Javie utility toolkit.
//!
//! This crate has minimal dependencies and holds the pieces every Javie module
//! shares:
//!
//! - [`Config`] - flat key/value configuration with "defaults" merge semantics
//! - [`InstanceCache`] - lazily built, shared instances keyed by name
//! - [`Switch`] - an on/off flag shared between a module and its instances
//!
//! # Error Types
//!
//! - [`JavieError`] - Top-level error type
//! - [`DispatchError`] - Event dispatcher errors
//! - [`RequestError`] - Request wrapper errors

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod switch;

// Re-exports
pub use cache::{DEFAULT_NAME, Instance, InstanceCache, normalize_name};
pub use config::{Config, merge_defaults};
pub use error::{BoxError, DispatchError, JavieError, RequestError};
pub use serde_json::Value;
pub use switch::Switch;
