//! Cache Module
//!
//! In-memory caching with TTL expiration, two-pass eviction (count-based LRU
//! then memory-based largest-first) and tag-based bulk invalidation.

mod entry;
pub(crate) mod eviction;
mod lru;
mod stats;
mod store;
mod tags;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use lru::LruTracker;
pub use stats::{CacheStats, StatsSnapshot};
pub use store::CacheStore;
pub use tags::TagIndex;
