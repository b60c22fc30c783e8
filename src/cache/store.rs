//! Cache Store Module
//!
//! The entry store: a key/value map combined with LRU tracking, TTL
//! expiration, a tag index and size accounting. All of it forms a single
//! consistency domain; the handle in `manager` serializes access behind one
//! lock so no partial update (an entry removed while its tag reference
//! lingers) is ever observable.

use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::cache::{eviction, CacheEntry, CacheStats, LruTracker, StatsSnapshot, TagIndex};
use crate::persist::{MirrorOp, PersistedRow};

// == Cache Store ==
/// Ground truth for what is currently cached.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Tag -> keys secondary index
    tags: TagIndex,
    /// Performance statistics
    stats: CacheStats,
    /// Running sum of all entry sizes
    total_size_bytes: u64,
    /// Maximum number of entries allowed
    max_entries: usize,
    /// Maximum aggregate value size allowed
    max_memory_bytes: u64,
    /// Queue to the durable mirror, when persistence is enabled
    mirror: Option<UnboundedSender<MirrorOp>>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new CacheStore with the given capacity limits.
    pub fn new(max_entries: usize, max_memory_bytes: u64) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            tags: TagIndex::new(),
            stats: CacheStats::new(),
            total_size_bytes: 0,
            max_entries,
            max_memory_bytes,
            mirror: None,
        }
    }

    // == Mirror Wiring ==
    /// Attaches the queue feeding the durable mirror writer.
    pub fn attach_mirror(&mut self, sender: UnboundedSender<MirrorOp>) {
        self.mirror = Some(sender);
    }

    /// Drops the mirror queue so the writer task can drain and exit.
    pub fn detach_mirror(&mut self) {
        self.mirror = None;
    }

    fn mirror_send(&self, op: MirrorOp) {
        if let Some(sender) = &self.mirror {
            // The writer only stops once the cache is closing; a send failure
            // drops the op, and the at-least-once mirror contract allows that.
            if sender.send(op).is_err() {
                debug!("Mirror writer gone, skipping durable write");
            }
        }
    }

    // == Set ==
    /// Stores a value with optional TTL and tags.
    ///
    /// An existing key is fully replaced: old tags, size and access counters
    /// are discarded along with the old value. A value larger than the whole
    /// memory budget is rejected without mutating any state. After insertion
    /// the eviction policy runs and may remove other entries; the key just
    /// written is never selected.
    pub fn set(
        &mut self,
        key: String,
        value: Vec<u8>,
        ttl_seconds: Option<u64>,
        tags: HashSet<String>,
    ) -> bool {
        let size_bytes = value.len() as u64;
        if size_bytes > self.max_memory_bytes {
            debug!(
                "Rejecting '{}': value of {} bytes exceeds the {} byte budget",
                key, size_bytes, self.max_memory_bytes
            );
            return false;
        }

        // Full replacement: retire the old entry's tags and size first so
        // nothing from the previous lifecycle leaks into the new one.
        if let Some(old) = self.entries.remove(&key) {
            self.tags.remove(&key, &old.tags);
            self.total_size_bytes = self.total_size_bytes.saturating_sub(old.size_bytes);
        }

        let entry = CacheEntry::new(value, ttl_seconds, tags);
        self.tags.insert(&key, &entry.tags);
        self.total_size_bytes += entry.size_bytes;
        self.mirror_send(MirrorOp::Upsert(PersistedRow::from_entry(&key, &entry)));

        self.entries.insert(key.clone(), entry);
        self.lru.touch(&key);
        self.sync_totals();

        self.enforce_limits(Some(&key));
        true
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit refreshes the access metadata and moves the key to the
    /// most-recently-used position. An entry whose TTL has elapsed is removed
    /// on the spot and reported as a miss, even before the next sweep.
    pub fn get(&mut self, key: &str) -> Option<Vec<u8>> {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            return None;
        }

        let value = match self.entries.get_mut(key) {
            Some(entry) => {
                entry.mark_accessed();
                entry.value.clone()
            }
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        self.lru.touch(key);
        self.stats.record_hit();
        Some(value)
    }

    // == Touch ==
    /// Refreshes recency and access count without returning the value.
    ///
    /// Does not count toward hit/miss statistics; the hit rate measures `get`
    /// calls only.
    pub fn touch(&mut self, key: &str) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };

        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            return false;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.mark_accessed();
            self.lru.touch(key);
            true
        } else {
            false
        }
    }

    // == Exists ==
    /// Read-only presence probe; does not affect recency or statistics.
    /// Reports false for entries whose TTL has already elapsed.
    pub fn exists(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    // == Delete ==
    /// Removes an entry and its tag associations; false if the key is absent.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Get With Tags ==
    /// Returns all live, non-expired entries carrying any of the given tags.
    pub fn get_with_tags(&self, tags: &[String]) -> HashMap<String, Vec<u8>> {
        let mut result = HashMap::new();
        for key in self.tags.keys_matching_any(tags) {
            if let Some(entry) = self.entries.get(&key) {
                if !entry.is_expired() {
                    result.insert(key, entry.value.clone());
                }
            }
        }
        result
    }

    // == Clear ==
    /// With tags: removes every entry carrying at least one matching tag.
    /// Without: removes everything, including the tag index and the
    /// accumulated statistics counters.
    pub fn clear(&mut self, tags: Option<&[String]>) {
        match tags {
            Some(tags) => {
                for key in self.tags.keys_matching_any(tags) {
                    self.remove_entry(&key);
                }
            }
            None => {
                self.entries.clear();
                self.lru.clear();
                self.tags.clear();
                self.total_size_bytes = 0;
                self.stats.reset();
                self.mirror_send(MirrorOp::Clear);
            }
        }
    }

    // == Set TTL ==
    /// Replaces the TTL of an existing entry. The new TTL is measured from
    /// the entry's original creation time.
    pub fn set_ttl(&mut self, key: &str, ttl_seconds: u64) -> bool {
        let expired = match self.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };
        if expired {
            self.remove_entry(key);
            self.stats.record_expiration();
            return false;
        }

        if let Some(entry) = self.entries.get_mut(key) {
            entry.ttl_seconds = Some(ttl_seconds);
            let row = PersistedRow::from_entry(key, entry);
            self.mirror_send(MirrorOp::Upsert(row));
            true
        } else {
            false
        }
    }

    // == TTL Remaining ==
    /// Remaining TTL in seconds for an entry, None if absent or unlimited.
    pub fn ttl_remaining(&self, key: &str) -> Option<u64> {
        self.entries.get(key).and_then(|entry| entry.ttl_remaining())
    }

    // == Cleanup Expired ==
    /// Removes all entries whose TTL has elapsed.
    ///
    /// Counted as expirations, not evictions. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();

        let count = expired_keys.len();
        for key in expired_keys {
            debug!("Removing expired entry '{}'", key);
            self.remove_entry(&key);
            self.stats.record_expiration();
        }

        count
    }

    // == Enforce Limits ==
    /// Runs the two-pass eviction policy and removes the selected victims.
    ///
    /// `protected` shields the key just written by `set`. Returns the number
    /// of evictions performed.
    pub fn enforce_limits(&mut self, protected: Option<&str>) -> usize {
        let victims = eviction::select_victims(
            &self.entries,
            &self.lru,
            self.total_size_bytes,
            self.max_entries,
            self.max_memory_bytes,
            protected,
        );

        let count = victims.len();
        for key in victims {
            debug!("Evicting '{}'", key);
            self.remove_entry(&key);
            self.stats.record_eviction();
        }

        count
    }

    // == Refresh Cleanup Timestamp ==
    /// Stamps the end of a sweep pass into the statistics.
    pub fn refresh_cleanup_timestamp(&mut self) {
        self.stats.mark_cleanup();
    }

    // == Restore ==
    /// Rehydrates the store from durable rows at startup.
    ///
    /// Entries must be supplied oldest-accessed first so the recency order is
    /// reconstructed. Nothing is mirrored back; limits are enforced at the
    /// end in case the configured budgets shrank since the snapshot.
    pub fn restore(&mut self, entries: Vec<(String, CacheEntry)>) {
        for (key, entry) in entries {
            self.tags.insert(&key, &entry.tags);
            self.total_size_bytes += entry.size_bytes;
            self.entries.insert(key.clone(), entry);
            self.lru.touch(&key);
        }
        self.sync_totals();
        self.enforce_limits(None);
    }

    // == Flush ==
    /// Queues a full snapshot of all live entries, replacing the prior
    /// durable contents. Entries already past TTL are left out.
    pub fn flush(&self) {
        if self.mirror.is_none() {
            return;
        }

        let rows: Vec<PersistedRow> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, entry)| PersistedRow::from_entry(key, entry))
            .collect();

        self.mirror_send(MirrorOp::Snapshot(rows));
    }

    // == Stats ==
    /// Returns a point-in-time statistics snapshot with derived fields.
    pub fn stats(&self) -> StatsSnapshot {
        let mut stats = self.stats.clone();
        stats.set_totals(self.entries.len(), self.total_size_bytes);
        stats.snapshot(self.max_memory_bytes)
    }

    // == Keys ==
    /// Returns all currently stored keys, expired or not yet swept included.
    pub fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // == Total Size ==
    /// Returns the aggregate size of all cached values in bytes.
    pub fn total_size_bytes(&self) -> u64 {
        self.total_size_bytes
    }

    // == Internals ==
    /// Removes one entry from the map, the recency tracker, the tag index
    /// and the durable mirror, keeping the running totals in step. The
    /// caller decides which counter (eviction, expiration, none) applies.
    fn remove_entry(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(entry) => {
                self.lru.remove(key);
                self.tags.remove(key, &entry.tags);
                self.total_size_bytes = self.total_size_bytes.saturating_sub(entry.size_bytes);
                self.mirror_send(MirrorOp::Delete(key.to_string()));
                self.sync_totals();
                true
            }
            None => false,
        }
    }

    fn sync_totals(&mut self) {
        self.stats
            .set_totals(self.entries.len(), self.total_size_bytes);
    }
}
