//! Pause Controller
//!
//! Stops the eviction sweeper before a pause and shifts every deadline by the
//! paused duration before restarting it.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::cache::Store;
use crate::clock::Clock;
use crate::error::{CacheError, Result};
use crate::lifecycle::Lifecycle;
use crate::tasks::EvictionSweeper;

/// Bounded wait for an in-flight sweep when pausing.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

// == Pause Controller ==
/// Coordinates one cache's sweeper and deadlines with pause/resume signals.
///
/// While paused nothing is evicted; reads through the cache still renew.
pub struct PauseController<K, V>
where
    K: Eq + Hash,
{
    store: Arc<Store<K, V>>,
    clock: Arc<dyn Clock>,
    sweeper: Arc<EvictionSweeper>,
    stop_timeout: Duration,
    /// Epoch seconds at which the pause began; `Some` while paused
    paused_at: Mutex<Option<i64>>,
}

impl<K, V> PauseController<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// `stop_timeout` bounds the wait for an in-flight sweep when pausing.
    pub fn new(
        store: Arc<Store<K, V>>,
        clock: Arc<dyn Clock>,
        sweeper: Arc<EvictionSweeper>,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            sweeper,
            stop_timeout,
            paused_at: Mutex::new(None),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.lock().is_some()
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper.is_running()
    }

    /// Epoch seconds at which the current pause began.
    pub fn paused_at(&self) -> Option<i64> {
        *self.paused_at.lock()
    }

    /// Resumes using the time elapsed on the cache clock since the pause.
    pub async fn resume(&self) -> Result<()> {
        let paused_at = self.paused_at().ok_or_else(|| {
            CacheError::InvalidLifecycle("resume requested while not paused".to_string())
        })?;
        let elapsed = self.clock.now().saturating_sub(paused_at).max(0) as u64;
        self.on_resumed(Duration::from_secs(elapsed)).await
    }
}

#[async_trait]
impl<K, V> Lifecycle for PauseController<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        "expiring-cache"
    }

    /// Stops the sweeper, waiting at most the stop timeout for an in-flight sweep.
    ///
    /// On `PauseTimeout` the sweeper task has been aborted and the controller
    /// stays paused, so a later resume re-arms it.
    async fn on_pause_requested(&self) -> Result<()> {
        {
            let mut paused_at = self.paused_at.lock();
            if paused_at.is_some() {
                return Err(CacheError::InvalidLifecycle(
                    "pause requested while already paused".to_string(),
                ));
            }
            *paused_at = Some(self.clock.now());
        }

        info!("Pause requested, stopping eviction sweeper");
        if let Err(e) = self.sweeper.stop(self.stop_timeout).await {
            warn!("Pause did not quiesce the sweeper: {}", e);
            return Err(e);
        }
        info!("Cache paused with {} entries", self.store.len());
        Ok(())
    }

    /// Shifts every deadline by `paused_for`, then restarts the sweeper.
    ///
    /// Partial seconds round up so entries are never under-compensated.
    async fn on_resumed(&self, paused_for: Duration) -> Result<()> {
        if self.paused_at.lock().take().is_none() {
            return Err(CacheError::InvalidLifecycle(
                "resume requested while not paused".to_string(),
            ));
        }

        let mut shift = paused_for.as_secs();
        if paused_for.subsec_nanos() > 0 {
            shift = shift.saturating_add(1);
        }
        let shift = i64::try_from(shift).unwrap_or(i64::MAX);

        let shifted = self.store.shift_all(shift);
        info!(
            "Resumed after {:?}: shifted {} entries by {}s",
            paused_for, shifted, shift
        );

        self.sweeper.restart(Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::cache::{CacheEntry, CacheStats};
    use crate::clock::ManualClock;
    use crate::tasks::{ExpirySweep, Sweep};

    /// Blocks inside its first sweep; later sweeps return at once.
    struct StuckSweep {
        started: AtomicBool,
        sweeps: AtomicUsize,
        hold: Duration,
    }

    impl Sweep for StuckSweep {
        fn sweep(&self) -> usize {
            if self.sweeps.fetch_add(1, Ordering::SeqCst) == 0 {
                self.started.store(true, Ordering::SeqCst);
                std::thread::sleep(self.hold);
            }
            0
        }
    }

    struct Fixture {
        store: Arc<Store<&'static str, u32>>,
        clock: Arc<ManualClock>,
        controller: PauseController<&'static str, u32>,
    }

    fn fixture(start: i64) -> Fixture {
        let store = Arc::new(Store::new());
        let clock = Arc::new(ManualClock::new(start));
        let target = Arc::new(ExpirySweep::new(
            Arc::clone(&store),
            clock.clone(),
            Arc::new(CacheStats::new()),
        ));
        // Long initial delay: the tests drive sweeps explicitly.
        let sweeper = Arc::new(
            EvictionSweeper::start(target, Duration::from_secs(3600), Duration::from_secs(1))
                .unwrap(),
        );
        let controller = PauseController::new(
            Arc::clone(&store),
            clock.clone(),
            sweeper,
            DEFAULT_STOP_TIMEOUT,
        );
        Fixture {
            store,
            clock,
            controller,
        }
    }

    #[tokio::test]
    async fn test_pause_stops_sweeper() {
        let f = fixture(0);
        assert!(f.controller.is_sweeping());

        f.controller.on_pause_requested().await.unwrap();

        assert!(f.controller.is_paused());
        assert!(!f.controller.is_sweeping());
        assert_eq!(f.controller.paused_at(), Some(0));
    }

    #[tokio::test]
    async fn test_resume_shifts_deadlines_and_restarts() {
        let f = fixture(18);
        f.store.put("a", CacheEntry { value: 1, expires_at: 20 });
        f.store.put("b", CacheEntry { value: 2, expires_at: 40 });

        f.controller.on_pause_requested().await.unwrap();
        f.clock.set(118);
        f.controller.on_resumed(Duration::from_secs(100)).await.unwrap();

        assert_eq!(f.store.expires_at(&"a"), Some(120));
        assert_eq!(f.store.expires_at(&"b"), Some(140));
        assert!(!f.controller.is_paused());
        assert!(f.controller.is_sweeping());
    }

    #[tokio::test]
    async fn test_resume_rounds_partial_seconds_up() {
        let f = fixture(0);
        f.store.put("a", CacheEntry { value: 1, expires_at: 10 });

        f.controller.on_pause_requested().await.unwrap();
        f.controller.on_resumed(Duration::from_millis(2_500)).await.unwrap();

        assert_eq!(f.store.expires_at(&"a"), Some(13));
    }

    #[tokio::test]
    async fn test_resume_measures_elapsed_on_clock() {
        let f = fixture(1_000);
        f.store.put("a", CacheEntry { value: 1, expires_at: 1_005 });

        f.controller.on_pause_requested().await.unwrap();
        f.clock.advance(300);
        f.controller.resume().await.unwrap();

        assert_eq!(f.store.expires_at(&"a"), Some(1_305));
    }

    #[tokio::test]
    async fn test_resume_with_maximal_duration_saturates() {
        let f = fixture(0);
        f.store.put("a", CacheEntry { value: 1, expires_at: 10 });

        f.controller.on_pause_requested().await.unwrap();
        f.controller.on_resumed(Duration::MAX).await.unwrap();

        assert_eq!(f.store.expires_at(&"a"), Some(i64::MAX));
        assert!(f.controller.is_sweeping());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pause_timeout_is_surfaced_and_resume_rearms() {
        let store: Arc<Store<&'static str, u32>> = Arc::new(Store::new());
        let target = Arc::new(StuckSweep {
            started: AtomicBool::new(false),
            sweeps: AtomicUsize::new(0),
            hold: Duration::from_millis(500),
        });
        let sweeper = Arc::new(
            EvictionSweeper::start(target.clone(), Duration::ZERO, Duration::from_millis(10))
                .unwrap(),
        );
        let controller = PauseController::new(
            Arc::clone(&store),
            Arc::new(ManualClock::new(0)),
            sweeper,
            Duration::from_millis(50),
        );

        while !target.started.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        let result = controller.on_pause_requested().await;
        assert!(matches!(result, Err(CacheError::PauseTimeout(_))));
        assert!(controller.is_paused());
        assert!(!controller.is_sweeping());

        // Let the aborted sweep finish on its worker before re-arming.
        tokio::time::sleep(Duration::from_millis(600)).await;
        controller.on_resumed(Duration::from_secs(1)).await.unwrap();
        assert!(!controller.is_paused());
        assert!(controller.is_sweeping());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(target.sweeps.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_double_pause_rejected() {
        let f = fixture(0);
        f.controller.on_pause_requested().await.unwrap();

        let result = f.controller.on_pause_requested().await;
        assert!(matches!(result, Err(CacheError::InvalidLifecycle(_))));
        assert!(f.controller.is_paused());
    }

    #[tokio::test]
    async fn test_resume_without_pause_rejected() {
        let f = fixture(0);
        f.store.put("a", CacheEntry { value: 1, expires_at: 10 });

        let result = f.controller.on_resumed(Duration::from_secs(100)).await;
        assert!(matches!(result, Err(CacheError::InvalidLifecycle(_))));
        assert_eq!(f.store.expires_at(&"a"), Some(10), "No shift without a pause");

        let result = f.controller.resume().await;
        assert!(matches!(result, Err(CacheError::InvalidLifecycle(_))));
    }

    #[tokio::test]
    async fn test_repeated_cycles() {
        let f = fixture(0);
        f.store.put("a", CacheEntry { value: 1, expires_at: 10 });

        for _ in 0..3 {
            f.controller.on_pause_requested().await.unwrap();
            f.controller.on_resumed(Duration::from_secs(5)).await.unwrap();
        }

        assert_eq!(f.store.expires_at(&"a"), Some(25));
        assert!(f.controller.is_sweeping());
    }
}
