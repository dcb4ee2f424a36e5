//! Shared plumbing for the MediBook client crates.
//!
//! This crate provides:
//! - `ClientConfig` - API, guard, search and logging settings
//! - `init_logging` - `tracing` subscriber bootstrap

mod config;
mod logging;

pub use config::*;
pub use logging::*;
