//! Expiring Cache Module
//!
//! Public cache facade combining the store with sliding-TTL renewal, the
//! background sweeper and the pause controller.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::cache::{
    CacheEntry, CacheStats, StatsSnapshot, Store, DEFAULT_CACHE_TIMEOUT, DEFAULT_INITIAL_DELAY,
    DEFAULT_SWEEP_INTERVAL, MAX_CACHE_TIMEOUT,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::lifecycle::{Lifecycle, PauseController, DEFAULT_STOP_TIMEOUT};
use crate::tasks::{sweep_store, EvictionSweeper, ExpirySweep};

// == Cache Settings ==
/// Construction parameters for [`ExpiringCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Sliding TTL; whole seconds, between one and `MAX_CACHE_TIMEOUT`
    pub timeout: Duration,
    /// Delay before the first sweep after construction
    pub initial_delay: Duration,
    /// Period between sweeps
    pub sweep_interval: Duration,
    /// Bounded wait for an in-flight sweep when pausing
    pub pause_timeout: Duration,
}

impl CacheSettings {
    /// Settings with the given timeout and default sweep timing.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            initial_delay: Duration::from_secs(DEFAULT_INITIAL_DELAY),
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL),
            pause_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    pub fn with_initial_delay(mut self, initial_delay: Duration) -> Self {
        self.initial_delay = initial_delay;
        self
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_pause_timeout(mut self, pause_timeout: Duration) -> Self {
        self.pause_timeout = pause_timeout;
        self
    }

    /// Rejects timeouts that are not a whole number of seconds in
    /// `1..=MAX_CACHE_TIMEOUT`, and zero sweep or pause intervals.
    pub fn validate(&self) -> Result<()> {
        let secs = self.timeout.as_secs();
        if secs == 0 || secs > MAX_CACHE_TIMEOUT {
            return Err(CacheError::InvalidConfig(format!(
                "timeout must be between 1 and {} seconds, got {:?}",
                MAX_CACHE_TIMEOUT, self.timeout
            )));
        }
        if self.timeout.subsec_nanos() != 0 {
            return Err(CacheError::InvalidConfig(format!(
                "timeout must be a whole number of seconds, got {:?}",
                self.timeout
            )));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::InvalidConfig(
                "sweep interval must be positive".to_string(),
            ));
        }
        if self.pause_timeout.is_zero() {
            return Err(CacheError::InvalidConfig(
                "pause timeout must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Only meaningful after `validate`, which bounds the timeout.
    fn timeout_secs(&self) -> i64 {
        i64::try_from(self.timeout.as_secs()).unwrap_or(i64::MAX)
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_CACHE_TIMEOUT))
    }
}

// == Expiring Cache ==
/// Generic key/value cache with sliding TTL.
///
/// Inserting a value sets its deadline to `now + timeout`. Every successful
/// `get` pushes the deadline forward by another `timeout`, measured from the
/// current deadline rather than from `now`, so frequently read keys drift
/// further into the future. Expired entries are removed only by the sweeper;
/// reads never evict.
///
/// All operations take `&self` and are safe to call from any thread while a
/// sweep is running.
pub struct ExpiringCache<K, V>
where
    K: Eq + Hash,
{
    store: Arc<Store<K, V>>,
    clock: Arc<dyn Clock>,
    stats: Arc<CacheStats>,
    timeout_secs: i64,
    controller: Arc<PauseController<K, V>>,
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a cache driven by the system clock and starts its sweeper.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(settings: CacheSettings) -> Result<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Creates a cache driven by `clock` and starts its sweeper.
    pub fn with_clock(settings: CacheSettings, clock: Arc<dyn Clock>) -> Result<Self> {
        settings.validate()?;

        let store = Arc::new(Store::new());
        let stats = Arc::new(CacheStats::new());
        let target = Arc::new(ExpirySweep::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            Arc::clone(&stats),
        ));
        let sweeper = Arc::new(EvictionSweeper::start(
            target,
            settings.initial_delay,
            settings.sweep_interval,
        )?);
        let controller = Arc::new(PauseController::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            sweeper,
            settings.pause_timeout,
        ));

        info!(
            "Expiring cache created: timeout={:?}, initial_delay={:?}, sweep_interval={:?}, \
             pause_timeout={:?}",
            settings.timeout,
            settings.initial_delay,
            settings.sweep_interval,
            settings.pause_timeout
        );

        Ok(Self {
            store,
            clock,
            stats,
            timeout_secs: settings.timeout_secs(),
            controller,
        })
    }

    // == Put ==
    /// Stores `value` with a fresh deadline, replacing any previous entry.
    pub fn put(&self, key: K, value: V) {
        let entry = CacheEntry::new(value, self.clock.now(), self.timeout_secs);
        self.store.put(key, entry);
    }

    // == Get ==
    /// Returns the value for `key` and extends its deadline by the timeout.
    ///
    /// Absent keys return `None` with no side effect. Entries past their
    /// deadline but not yet swept are still returned and renewed.
    pub fn get(&self, key: &K) -> Option<V> {
        let value = self.store.refresh(key, self.timeout_secs);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    // == Contains Key ==
    /// Reports presence in the store without renewing the deadline.
    pub fn contains_key(&self, key: &K) -> bool {
        self.store.contains_key(key)
    }

    // == Remove ==
    /// Removes `key`. Absent keys are a no-op.
    pub fn remove(&self, key: &K) {
        self.store.remove(key);
    }

    // == Clear ==
    /// Drops every entry in one atomic swap.
    pub fn clear(&self) {
        self.store.clear();
    }

    // == Size ==
    /// Number of entries held, including expired ones not yet swept.
    pub fn size(&self) -> usize {
        self.store.len()
    }

    // == Clean ==
    /// Runs one sweep immediately and returns the number of evicted entries.
    pub fn clean(&self) -> usize {
        let removed = sweep_store(&self.store, self.clock.now());
        self.stats.record_sweep(removed);
        removed
    }

    /// Deadline of `key` in epoch seconds, without renewing it.
    pub fn expires_at(&self, key: &K) -> Option<i64> {
        self.store.expires_at(key)
    }

    /// Current counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.store.len())
    }

    // == Lifecycle ==
    /// The controller to register with a [`crate::lifecycle::LifecycleNotifier`].
    pub fn pause_controller(&self) -> Arc<PauseController<K, V>> {
        Arc::clone(&self.controller)
    }

    /// Stops the sweeper. See [`PauseController`].
    pub async fn pause(&self) -> Result<()> {
        self.controller.on_pause_requested().await
    }

    /// Shifts every deadline by `paused_for` and restarts the sweeper.
    pub async fn resume(&self, paused_for: Duration) -> Result<()> {
        self.controller.on_resumed(paused_for).await
    }

    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    pub fn is_sweeping(&self) -> bool {
        self.controller.is_sweeping()
    }
}
