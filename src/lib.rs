//! Tagcache - a bounded in-process caching engine
//!
//! Caches derived artifacts (repeated lookups, computed responses) under
//! strict entry-count and memory budgets, with TTL expiration, tag-based
//! bulk invalidation and an optional durable SQLite mirror that repopulates
//! the cache after a restart. The in-memory state is always authoritative;
//! the mirror is advisory.
//!
//! Construct one [`CacheManager`] at startup and pass it by reference to
//! every consumer.

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod persist;
pub mod tasks;

pub use cache::{CacheEntry, CacheStats, CacheStore, StatsSnapshot};
pub use config::Config;
pub use error::{CacheError, Result};
pub use manager::CacheManager;
pub use tasks::spawn_sweep_task;
