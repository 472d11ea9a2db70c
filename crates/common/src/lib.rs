//! Sunlapse Common Utilities
//!
//! Shared infrastructure for all Sunlapse crates:
//! - Error types and result aliases
//! - Capture-date clock used to stamp frame filenames
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
