//! Resume Cache - a sliding-TTL in-memory cache
//!
//! Entries expire a fixed timeout after their last read, are collected by a
//! background sweeper, and keep their remaining lifetime across a process
//! pause/resume cycle.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod tasks;
pub mod workload;

pub use cache::{CacheSettings, ExpiringCache, StatsSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use lifecycle::{Lifecycle, LifecycleNotifier, PauseController};
