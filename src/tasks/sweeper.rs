//! Eviction Sweeper
//!
//! Background task that periodically removes expired cache entries, and the
//! sweep algorithm it runs.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, Store};
use crate::clock::Clock;
use crate::error::{CacheError, Result};

// == Sweep Algorithm ==
/// Returns the keys whose deadline is strictly before `now`.
///
/// Every key is judged against the same `now`, so a long enumeration does not
/// skew the result.
pub fn collect_expired<K, V>(store: &Store<K, V>, now: i64) -> Vec<K>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    store
        .keys()
        .into_iter()
        .filter(|key| matches!(store.expires_at(key), Some(expires_at) if now > expires_at))
        .collect()
}

/// Runs one sweep: collect expired keys, then remove exactly those keys.
///
/// Removal does not re-check the deadline. A key renewed by a concurrent `get`
/// after collection is still removed.
pub fn sweep_store<K, V>(store: &Store<K, V>, now: i64) -> usize
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    let expired = collect_expired(store, now);
    if expired.is_empty() {
        return 0;
    }
    store.remove_all(&expired)
}

// == Sweep Target ==
/// Something the sweeper can run on every tick.
pub trait Sweep: Send + Sync + 'static {
    /// Performs one sweep and returns the number of entries evicted.
    fn sweep(&self) -> usize;
}

/// Sweep target for a cache store: one clock reading per tick, stats recorded.
pub struct ExpirySweep<K, V>
where
    K: Eq + Hash,
{
    store: Arc<Store<K, V>>,
    clock: Arc<dyn Clock>,
    stats: Arc<CacheStats>,
}

impl<K, V> ExpirySweep<K, V>
where
    K: Eq + Hash,
{
    pub fn new(store: Arc<Store<K, V>>, clock: Arc<dyn Clock>, stats: Arc<CacheStats>) -> Self {
        Self {
            store,
            clock,
            stats,
        }
    }
}

impl<K, V> Sweep for ExpirySweep<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        let removed = sweep_store(&self.store, self.clock.now());
        self.stats.record_sweep(removed);
        removed
    }
}

// == Sweeper State ==
enum SweeperState {
    Running {
        stop: oneshot::Sender<()>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

// == Eviction Sweeper ==
/// Owns the periodic sweep task.
///
/// Two states: Running (timer armed) and Stopped. Dropping the sweeper drops
/// the stop channel, which ends the task after any in-flight tick.
pub struct EvictionSweeper {
    target: Arc<dyn Sweep>,
    interval: Duration,
    runtime: Handle,
    state: Mutex<SweeperState>,
}

impl EvictionSweeper {
    /// Starts sweeping `target` every `interval`, first tick after `initial_delay`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(
        target: Arc<dyn Sweep>,
        initial_delay: Duration,
        interval: Duration,
    ) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| CacheError::SweeperFailed(format!("no tokio runtime: {}", e)))?;

        let sweeper = Self {
            target,
            interval,
            runtime,
            state: Mutex::new(SweeperState::Stopped),
        };
        sweeper.arm(initial_delay);
        Ok(sweeper)
    }

    /// Returns true while the timer is armed.
    pub fn is_running(&self) -> bool {
        matches!(*self.state.lock(), SweeperState::Running { .. })
    }

    /// Re-arms a stopped sweeper. The first tick fires after `delay`.
    ///
    /// Returns `InvalidLifecycle` if the sweeper is already running.
    pub fn restart(&self, delay: Duration) -> Result<()> {
        if self.is_running() {
            return Err(CacheError::InvalidLifecycle(
                "sweeper is already running".to_string(),
            ));
        }
        self.arm(delay);
        Ok(())
    }

    /// Disarms the timer and waits, at most `wait`, for an in-flight tick to end.
    ///
    /// On timeout the task is aborted and `PauseTimeout` is returned; the
    /// sweeper is Stopped either way. Stopping a stopped sweeper is a no-op.
    pub async fn stop(&self, wait: Duration) -> Result<()> {
        let previous = std::mem::replace(&mut *self.state.lock(), SweeperState::Stopped);
        let SweeperState::Running { stop, mut handle } = previous else {
            debug!("Eviction sweeper already stopped");
            return Ok(());
        };

        // The task may already be gone; it ends on its own when the send fails.
        let _ = stop.send(());

        match time::timeout(wait, &mut handle).await {
            Ok(Ok(())) => {
                info!("Eviction sweeper stopped");
                Ok(())
            }
            Ok(Err(e)) => {
                warn!("Eviction sweeper task failed: {}", e);
                Err(CacheError::SweeperFailed(e.to_string()))
            }
            Err(_) => {
                handle.abort();
                warn!("Eviction sweeper did not stop within {:?}", wait);
                Err(CacheError::PauseTimeout(wait))
            }
        }
    }

    fn arm(&self, delay: Duration) {
        let (stop, stop_rx) = oneshot::channel();
        let handle = self.spawn_sweep_task(delay, stop_rx);
        *self.state.lock() = SweeperState::Running { stop, handle };
    }

    fn spawn_sweep_task(
        &self,
        delay: Duration,
        mut stop_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let target = Arc::clone(&self.target);
        let interval = self.interval;

        self.runtime.spawn(async move {
            info!(
                "Starting eviction sweeper: first sweep in {:?}, then every {:?}",
                delay, interval
            );

            let mut ticker = time::interval_at(Instant::now() + delay, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => {
                        debug!("Eviction sweeper received stop signal");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = target.sweep();
                        if removed > 0 {
                            info!("Eviction sweep: removed {} expired entries", removed);
                        } else {
                            debug!("Eviction sweep: no expired entries found");
                        }
                    }
                }
            }
        })
    }
}
