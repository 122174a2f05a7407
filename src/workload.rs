//! Prime Workload
//!
//! A CPU-bound consumer of the cache: checks random numbers for primality and
//! memoizes every answer. Used by the demo binary to show the cache warming up
//! and staying warm across a pause.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::ExpiringCache;

/// Numbers checked per batch
pub const BATCH_SIZE: usize = 100_000;

/// Exclusive upper bound for the numbers checked
pub const UPPER_BOUND: u64 = 100_000;

/// Result of one batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchReport {
    pub elapsed: Duration,
    pub primes: usize,
    pub cached_entries: usize,
}

/// Naive trial division; cost grows linearly with `number`.
pub fn compute_is_prime(number: u64) -> bool {
    if number < 2 {
        return false;
    }
    (2..number).all(|divisor| number % divisor != 0)
}

/// Looks `number` up in the cache, computing and storing it on a miss.
pub fn is_prime(cache: &ExpiringCache<u64, bool>, number: u64) -> bool {
    if cache.contains_key(&number) {
        // The sweeper may remove the key between the two calls.
        if let Some(cached) = cache.get(&number) {
            return cached;
        }
    }
    let result = compute_is_prime(number);
    cache.put(number, result);
    result
}

/// Checks `count` random numbers below `upper_bound`.
pub fn run_batch(cache: &ExpiringCache<u64, bool>, count: usize, upper_bound: u64) -> BatchReport {
    let mut rng = rand::thread_rng();
    let started = Instant::now();
    let primes = (0..count)
        .filter(|_| is_prime(cache, rng.gen_range(0..upper_bound)))
        .count();

    BatchReport {
        elapsed: started.elapsed(),
        primes,
        cached_entries: cache.size(),
    }
}

/// Spawns a task that runs a full batch every `interval`.
///
/// Each batch runs on the blocking pool. Batches never overlap: a slow batch
/// delays the next one.
pub fn spawn_workload_task(
    cache: Arc<ExpiringCache<u64, bool>>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting prime workload every {:?}", interval);

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut run = 1u64;

        loop {
            ticker.tick().await;

            let batch_cache = Arc::clone(&cache);
            let report = tokio::task::spawn_blocking(move || {
                run_batch(&batch_cache, BATCH_SIZE, UPPER_BOUND)
            })
            .await;

            match report {
                Ok(report) => info!(
                    "{}. Run: {} ms ({} primes, {} elements in cache)",
                    run,
                    report.elapsed.as_millis(),
                    report.primes,
                    report.cached_entries
                ),
                Err(e) => warn!("Workload batch {} failed: {}", run, e),
            }
            run += 1;
        }
    })
}
