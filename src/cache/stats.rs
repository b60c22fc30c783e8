//! Cache Statistics Module
//!
//! Tracks cache performance metrics: hits, misses, evictions, expirations,
//! current totals, and derived hit rate / memory usage figures.

use serde::Serialize;

use crate::cache::entry::current_timestamp_ms;

// == Cache Stats ==
/// Raw counters maintained by the entry store.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hit_count: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub miss_count: u64,
    /// Number of entries removed by the eviction policy
    pub eviction_count: u64,
    /// Number of entries removed because their TTL elapsed
    pub expired_count: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current aggregate size of all cached values
    pub total_size_bytes: u64,
    /// Timestamp of the last sweep pass (Unix milliseconds)
    pub last_cleanup: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self {
            last_cleanup: current_timestamp_ms(),
            ..Self::default()
        }
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hit_count += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.miss_count += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.eviction_count += 1;
    }

    // == Record Expiration ==
    pub fn record_expiration(&mut self) {
        self.expired_count += 1;
    }

    // == Update Totals ==
    /// Updates the current entry count and aggregate size.
    pub fn set_totals(&mut self, entries: usize, size_bytes: u64) {
        self.total_entries = entries;
        self.total_size_bytes = size_bytes;
    }

    // == Mark Cleanup ==
    /// Records the completion time of a sweep pass.
    pub fn mark_cleanup(&mut self) {
        self.last_cleanup = current_timestamp_ms();
    }

    // == Reset ==
    /// Zeroes all accumulated counters and totals. Used by a full clear.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    // == Snapshot ==
    /// Produces a caller-facing snapshot with derived fields filled in.
    pub fn snapshot(&self, max_memory_bytes: u64) -> StatsSnapshot {
        let memory_usage_percent = if max_memory_bytes > 0 {
            self.total_size_bytes as f64 / max_memory_bytes as f64 * 100.0
        } else {
            0.0
        };

        StatsSnapshot {
            total_entries: self.total_entries,
            total_size_bytes: self.total_size_bytes,
            hit_count: self.hit_count,
            miss_count: self.miss_count,
            eviction_count: self.eviction_count,
            expired_count: self.expired_count,
            hit_rate: self.hit_rate(),
            memory_usage_percent,
            last_cleanup: self.last_cleanup,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time view of cache statistics, including derived fields.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_entries: usize,
    pub total_size_bytes: u64,
    pub hit_count: u64,
    pub miss_count: u64,
    pub eviction_count: u64,
    pub expired_count: u64,
    pub hit_rate: f64,
    pub memory_usage_percent: f64,
    /// Unix milliseconds of the last sweep pass
    pub last_cleanup: u64,
}
