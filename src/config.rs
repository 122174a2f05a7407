//! Configuration Module
//!
//! Loads cache configuration from a key/value properties file or from
//! environment variables. Unparseable or non-positive values are rejected
//! instead of silently falling back to defaults.

use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::cache::CacheSettings;
use crate::error::{CacheError, Result};

// == Property Keys ==
/// Properties key for the sweep interval in seconds
pub const KEY_INTERVAL: &str = "interval";
/// Properties key for the delay before the first sweep in seconds
pub const KEY_INITIAL_DELAY: &str = "initial_cache_clean_delay";
/// Properties key for the sliding TTL in seconds
pub const KEY_CACHE_TIMEOUT: &str = "cache_timeout";
/// Properties key for the cleanup-on-exit flag
pub const KEY_CLEANUP: &str = "cleanup";

/// Cache configuration parameters.
///
/// All durations are whole seconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sliding TTL applied on insert and on every successful read
    pub cache_timeout: u64,
    /// Delay before the first eviction sweep
    pub initial_delay: u64,
    /// Period between eviction sweeps
    pub sweep_interval: u64,
    /// Remove scratch files when the process exits
    pub cleanup: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TIMEOUT` - Sliding TTL in seconds (default: 10)
    /// - `INITIAL_CACHE_CLEAN_DELAY` - First sweep delay in seconds (default: 50)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep period in seconds (default: 1)
    /// - `CACHE_CLEANUP` - Remove scratch files on exit (default: false)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            cache_timeout: env_or("CACHE_TIMEOUT", defaults.cache_timeout)?,
            initial_delay: env_or("INITIAL_CACHE_CLEAN_DELAY", defaults.initial_delay)?,
            sweep_interval: env_or("CACHE_SWEEP_INTERVAL", defaults.sweep_interval)?,
            cleanup: env_or("CACHE_CLEANUP", defaults.cleanup)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads a properties file from disk.
    ///
    /// See [`Config::from_properties_str`] for the accepted format.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            CacheError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_properties_str(&contents)
    }

    /// Parses `key=value` (or `key: value`) lines.
    ///
    /// Blank lines and lines starting with `#` or `!` are skipped. Keys that are
    /// absent keep their default; unknown keys are ignored.
    pub fn from_properties_str(contents: &str) -> Result<Self> {
        let mut config = Self::default();

        for (line_no, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let (key, value) = line
                .split_once(|c: char| c == '=' || c == ':')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| {
                    CacheError::InvalidConfig(format!(
                        "line {}: expected key=value, got '{}'",
                        line_no + 1,
                        line
                    ))
                })?;

            match key {
                KEY_CACHE_TIMEOUT => config.cache_timeout = parse_value(key, value)?,
                KEY_INITIAL_DELAY => config.initial_delay = parse_value(key, value)?,
                KEY_INTERVAL => config.sweep_interval = parse_value(key, value)?,
                KEY_CLEANUP => config.cleanup = parse_value(key, value)?,
                other => debug!("Ignoring unknown config key '{}'", other),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects non-positive or out-of-range timeouts and intervals.
    pub fn validate(&self) -> Result<()> {
        self.cache_settings().validate()
    }

    /// Converts the configuration into settings for [`crate::ExpiringCache`].
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings::new(Duration::from_secs(self.cache_timeout))
            .with_initial_delay(Duration::from_secs(self.initial_delay))
            .with_sweep_interval(Duration::from_secs(self.sweep_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_timeout: 10,
            initial_delay: 50,
            sweep_interval: 1,
            cleanup: false,
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CacheError::InvalidConfig(format!("invalid value '{}' for {}", value, key)))
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(value) => parse_value(name, value.trim()),
        Err(_) => Ok(default),
    }
}
