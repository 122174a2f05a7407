//! Resume Cache demo
//!
//! Runs a memoized prime-checking workload against an expiring cache and
//! forwards operator pause/resume signals to it.
//!
//! # Signals (unix)
//! - `SIGUSR1` - pause: stop the eviction sweeper
//! - `SIGUSR2` - resume: shift every deadline by the paused time, restart the sweeper
//! - `SIGINT` / `SIGTERM` - shut down

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resume_cache::workload::spawn_workload_task;
use resume_cache::{Config, ExpiringCache, LifecycleNotifier};

/// Seconds between workload batches
const WORKLOAD_INTERVAL: Duration = Duration::from_secs(5);

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from `CACHE_CONFIG` or environment variables
/// 3. Create the cache and register it for pause/resume
/// 4. Start the prime workload
/// 5. Dispatch signals until shutdown, then clean up scratch files if configured
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resume_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Cache (PID {})", std::process::id());

    let config = load_config()?;
    info!(
        "Configuration loaded: cache_timeout={}s, initial_delay={}s, sweep_interval={}s, \
         cleanup={}",
        config.cache_timeout, config.initial_delay, config.sweep_interval, config.cleanup
    );

    let scratch_dir = scratch_dir();
    fs::create_dir_all(&scratch_dir)
        .with_context(|| format!("creating scratch directory {}", scratch_dir.display()))?;

    let cache = Arc::new(
        ExpiringCache::<u64, bool>::new(config.cache_settings()).context("creating cache")?,
    );
    let notifier = LifecycleNotifier::new();
    notifier.register(cache.pause_controller());

    let workload = spawn_workload_task(Arc::clone(&cache), WORKLOAD_INTERVAL);
    info!("First run will take a while until the cache is warm...");

    run_signal_loop(&notifier).await?;

    workload.abort();
    let stats = cache.stats();
    info!(
        "Final stats: {} entries, hit rate {:.2}, {} evicted over {} sweeps",
        stats.total_entries,
        stats.hit_rate(),
        stats.evictions,
        stats.sweeps
    );

    if config.cleanup {
        clean_scratch_dir(&scratch_dir);
    }

    info!("Resume Cache stopped");
    Ok(())
}

fn load_config() -> anyhow::Result<Config> {
    match env::var("CACHE_CONFIG") {
        Ok(path) => Config::from_properties_file(&path)
            .with_context(|| format!("loading configuration from {}", path)),
        Err(_) => Config::from_env().context("loading configuration from environment"),
    }
}

fn scratch_dir() -> PathBuf {
    env::var("CACHE_SCRATCH_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("scratch"))
}

/// Deletes plain files in `dir`; subdirectories are left alone.
fn clean_scratch_dir(dir: &Path) {
    info!("Cleanup {}", dir.display());
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Cannot read {}: {}", dir.display(), e);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() {
            if let Err(e) = fs::remove_file(&path) {
                warn!("Cannot remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Forwards pause/resume signals until a shutdown signal arrives.
///
/// Pause and resume failures are logged and do not stop the process.
#[cfg(unix)]
async fn run_signal_loop(notifier: &LifecycleNotifier) -> anyhow::Result<()> {
    use signal::unix::{signal, SignalKind};

    let mut pause = signal(SignalKind::user_defined1()).context("installing SIGUSR1 handler")?;
    let mut resume = signal(SignalKind::user_defined2()).context("installing SIGUSR2 handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    loop {
        tokio::select! {
            _ = pause.recv() => {
                info!("Received SIGUSR1, pausing");
                if let Err(e) = notifier.pause().await {
                    error!("Pause failed: {}", e);
                }
            }
            _ = resume.recv() => {
                info!("Received SIGUSR2, resuming");
                if let Err(e) = notifier.resume().await {
                    error!("Resume failed: {}", e);
                }
            }
            result = signal::ctrl_c() => {
                result.context("waiting for Ctrl+C")?;
                info!("Received Ctrl+C, initiating shutdown...");
                return Ok(());
            }
            _ = terminate.recv() => {
                info!("Received SIGTERM, initiating shutdown...");
                return Ok(());
            }
        }
    }
}

#[cfg(not(unix))]
async fn run_signal_loop(_notifier: &LifecycleNotifier) -> anyhow::Result<()> {
    signal::ctrl_c().await.context("waiting for Ctrl+C")?;
    info!("Received Ctrl+C, initiating shutdown...");
    Ok(())
}
