//! CLI command implementations.
//!
//! - [`submit`] - Upload reports from a JSON file
//! - [`locate`] - Query a position estimate
//! - [`config`] - Configuration management (path, show, init)

pub mod common;
pub mod config;
pub mod locate;
pub mod submit;
