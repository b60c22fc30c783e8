//! Configuration Module
//!
//! Cache limits and behavior switches, loadable from environment variables.

use std::env;
use std::path::PathBuf;

use crate::error::{CacheError, Result};

/// Cache configuration parameters.
///
/// All values can be set via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Aggregate size budget for all cached values, in bytes
    pub max_memory_bytes: u64,
    /// Maximum number of entries the cache can hold
    pub max_entries: usize,
    /// Background sweep interval in seconds
    pub cleanup_interval_secs: u64,
    /// Whether mutations are mirrored to the durable store
    pub enable_persistence: bool,
    /// Path of the SQLite mirror database
    pub persistence_path: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_MEMORY_BYTES` - aggregate size budget (default: 100 MiB)
    /// - `CACHE_MAX_ENTRIES` - maximum cache entries (default: 1000)
    /// - `CACHE_CLEANUP_INTERVAL` - sweep frequency in seconds (default: 60)
    /// - `CACHE_ENABLE_PERSISTENCE` - durable mirror on/off (default: true)
    /// - `CACHE_PERSISTENCE_PATH` - mirror database path (default: cache.db)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_memory_bytes: env::var("CACHE_MAX_MEMORY_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_memory_bytes),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            cleanup_interval_secs: env::var("CACHE_CLEANUP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cleanup_interval_secs),
            enable_persistence: env::var("CACHE_ENABLE_PERSISTENCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.enable_persistence),
            persistence_path: env::var("CACHE_PERSISTENCE_PATH")
                .ok()
                .map(PathBuf::from)
                .unwrap_or(defaults.persistence_path),
        }
    }

    /// Rejects malformed limits before any state is built.
    ///
    /// Non-positive budgets or a zero sweep interval are programmer errors
    /// and fail fast here; nothing else about the cache surfaces errors at
    /// construction time besides opening the mirror database.
    pub fn validate(&self) -> Result<()> {
        if self.max_memory_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "max_memory_bytes must be positive".to_string(),
            ));
        }
        if self.max_entries == 0 {
            return Err(CacheError::InvalidConfig(
                "max_entries must be positive".to_string(),
            ));
        }
        if self.cleanup_interval_secs == 0 {
            return Err(CacheError::InvalidConfig(
                "cleanup_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_memory_bytes: 100 * 1024 * 1024,
            max_entries: 1000,
            cleanup_interval_secs: 60,
            enable_persistence: true,
            persistence_path: PathBuf::from("cache.db"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.max_memory_bytes, 100 * 1024 * 1024);
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.cleanup_interval_secs, 60);
        assert!(config.enable_persistence);
        assert_eq!(config.persistence_path, PathBuf::from("cache.db"));
    }

    #[test]
    fn test_config_from_env_defaults() {
        env::remove_var("CACHE_MAX_MEMORY_BYTES");
        env::remove_var("CACHE_MAX_ENTRIES");
        env::remove_var("CACHE_CLEANUP_INTERVAL");
        env::remove_var("CACHE_ENABLE_PERSISTENCE");
        env::remove_var("CACHE_PERSISTENCE_PATH");

        let config = Config::from_env();
        assert_eq!(config.max_entries, 1000);
        assert_eq!(config.cleanup_interval_secs, 60);
    }

    #[test]
    fn test_config_validate_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.max_entries = 0;
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));

        let mut config = Config::default();
        config.max_memory_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.cleanup_interval_secs = 0;
        assert!(config.validate().is_err());
    }
}
