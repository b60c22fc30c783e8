//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL and tag support.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single cached value with its accounting metadata.
///
/// The entry does not carry its own key; the entry store owns the keys and
/// the tag index holds only key references, so nothing can drift.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Opaque serialized payload
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Last access timestamp (Unix milliseconds)
    pub accessed_at: u64,
    /// Number of successful get/touch operations on this entry
    pub access_count: u64,
    /// Size of the serialized value, used for memory accounting
    pub size_bytes: u64,
    /// TTL in seconds, None = never expires
    pub ttl_seconds: Option<u64>,
    /// Tags this entry is indexed under
    pub tags: HashSet<String>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry with optional TTL and tags.
    ///
    /// A brand-new entry starts with a zero access count and fresh
    /// timestamps; re-inserting a key therefore restarts its lifecycle.
    pub fn new(value: Vec<u8>, ttl_seconds: Option<u64>, tags: HashSet<String>) -> Self {
        let now = current_timestamp_ms();
        let size_bytes = value.len() as u64;

        Self {
            value,
            created_at: now,
            accessed_at: now,
            access_count: 0,
            size_bytes,
            ttl_seconds,
            tags,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// Boundary condition: an entry is expired once the current time is
    /// greater than or equal to `created_at + ttl`, so an entry whose TTL
    /// has fully elapsed is never served even before the next sweep.
    pub fn is_expired(&self) -> bool {
        match self.expires_at() {
            Some(expires) => current_timestamp_ms() >= expires,
            None => false,
        }
    }

    // == Expires At ==
    /// Absolute expiry timestamp (Unix milliseconds), None = no expiration.
    pub fn expires_at(&self) -> Option<u64> {
        self.ttl_seconds
            .map(|ttl| self.created_at.saturating_add(ttl.saturating_mul(1000)))
    }

    // == Mark Accessed ==
    /// Records a successful access: refreshes `accessed_at` and increments
    /// the access counter.
    pub fn mark_accessed(&mut self) {
        self.accessed_at = current_timestamp_ms();
        self.access_count += 1;
    }

    // == Time To Live ==
    /// Returns remaining TTL in seconds, or None if no expiration is set.
    ///
    /// Returns `Some(0)` once the TTL has elapsed.
    pub fn ttl_remaining(&self) -> Option<u64> {
        self.expires_at().map(|expires| {
            let now = current_timestamp_ms();
            if expires > now {
                (expires - now) / 1000
            } else {
                0
            }
        })
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
