//! Cache Module
//!
//! Provides an in-memory cache with sliding TTL expiration.

mod entry;
mod stats;
mod store;
mod ttl_cache;


// Re-export public types
pub use entry::CacheEntry;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::Store;
pub use ttl_cache::{CacheSettings, ExpiringCache};

// == Public Constants ==
/// Default sliding TTL in seconds
pub const DEFAULT_CACHE_TIMEOUT: u64 = 60;

/// Longest accepted sliding TTL in seconds (100 years)
pub const MAX_CACHE_TIMEOUT: u64 = 100 * 365 * 24 * 60 * 60;

/// Default delay before the first sweep in seconds
pub const DEFAULT_INITIAL_DELAY: u64 = 30;

/// Default period between sweeps in seconds
pub const DEFAULT_SWEEP_INTERVAL: u64 = 1;
