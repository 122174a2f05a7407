//! Background Tasks Module
//!
//! Contains background tasks that run periodically while the cache is alive.
//!
//! # Tasks
//! - Eviction sweep: removes expired cache entries at a fixed interval

mod sweeper;

pub use sweeper::{collect_expired, sweep_store, EvictionSweeper, ExpirySweep, Sweep};
