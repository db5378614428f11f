//! Platform error types

use std::time::Duration;

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The platform refused to create a periodic timer
    #[error("Failed to create timer: {0}")]
    TimerCreation(String),

    /// A periodic timer needs a non-zero interval
    #[error("Invalid timer interval: {0:?}")]
    InvalidInterval(Duration),

    /// The run loop backing a timer has been dropped
    #[error("Platform not available: {0}")]
    Unavailable(String),

    /// Generic platform error
    #[error("Platform error: {0}")]
    Other(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
