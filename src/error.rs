//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache.
///
/// Missing keys are never reported through this type: lookups on absent keys
/// return `None` or `false`.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid timeout, interval or configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The sweeper did not stop within the bounded wait
    #[error("Sweeper did not stop within {0:?}")]
    PauseTimeout(Duration),

    /// Pause and resume were not issued as a matched pair
    #[error("Invalid lifecycle transition: {0}")]
    InvalidLifecycle(String),

    /// The sweeper task terminated abnormally
    #[error("Sweeper task failed: {0}")]
    SweeperFailed(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
