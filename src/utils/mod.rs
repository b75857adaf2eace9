//! Utility modules for error handling, configuration and logging

pub mod config;
pub mod error;
pub mod filename;
pub mod logging;

// Re-export for convenience
pub use config::AppSettings;
pub use error::{Result, TubefetchError};
pub use logging::{LogLevel, Logger};
