//! LRU Tracker Module
//!
//! Tracks access recency for the count-based eviction pass and for
//! recency tie-breaks in the memory-based pass.

use std::collections::{HashMap, VecDeque};

// == LRU Tracker ==
/// Tracks access order for LRU eviction.
///
/// Recency is recorded with lazy deletion: every touch pushes a fresh
/// `(key, seq)` pair to the front of the queue and bumps the key's live
/// sequence number, leaving any older pair for that key behind as a stale
/// marker. Readers skip pairs whose sequence no longer matches, and the
/// queue is compacted once stale markers outnumber live keys. This keeps
/// `touch` and `remove` O(1) amortized instead of scanning the queue.
///
/// Queue orientation:
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruTracker {
    /// Touch history, newest first; may contain stale pairs
    order: VecDeque<(String, u64)>,
    /// Current sequence number per live key
    live: HashMap<String, u64>,
    /// Next sequence number to hand out
    next_seq: u64,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
            live: HashMap::new(),
            next_seq: 0,
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves to front).
    ///
    /// Any previous position of the key becomes a stale marker; it is
    /// skipped on reads and dropped at the next compaction.
    pub fn touch(&mut self, key: &str) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.live.insert(key.to_string(), seq);
        self.order.push_front((key.to_string(), seq));
        self.maybe_compact();
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        self.live.remove(key);
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order
            .iter()
            .rev()
            .find(|(key, seq)| self.live.get(key) == Some(seq))
            .map(|(key, _)| key)
    }

    // == Iterate Oldest First ==
    /// Iterates keys from least recently used to most recently used.
    ///
    /// The eviction policy walks this order to plan removals without
    /// mutating the tracker. Stale markers are skipped.
    pub fn iter_oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order
            .iter()
            .rev()
            .filter(move |(key, seq)| self.live.get(key) == Some(seq))
            .map(|(key, _)| key)
    }

    // == Clear ==
    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
        self.live.clear();
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    // == Contains ==
    /// Checks if a key is being tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.live.contains_key(key)
    }

    // == Compaction ==
    /// Drops stale markers once they outnumber the live keys. Each live key
    /// pays for at most one dropped marker per touch, so the amortized cost
    /// stays constant.
    fn maybe_compact(&mut self) {
        if self.order.len() <= self.live.len().saturating_mul(2).max(16) {
            return;
        }
        let live = &self.live;
        self.order.retain(|(key, seq)| live.get(key) == Some(seq));
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
    }

    #[test]
    fn test_lru_touch_new_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        assert_eq!(lru.len(), 3);
        // key1 is oldest (added first)
        assert_eq!(lru.peek_oldest(), Some(&"key1".to_string()));
    }

    #[test]
    fn test_lru_touch_existing_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        // Touch key1 again - should move to front
        lru.touch("key1");

        assert_eq!(lru.len(), 3);
        // key2 is now oldest
        assert_eq!(lru.peek_oldest(), Some(&"key2".to_string()));
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.touch("key3");

        lru.remove("key2");

        assert_eq!(lru.len(), 2);
        assert!(!lru.contains("key2"));
        assert!(lru.contains("key1"));
        assert!(lru.contains("key3"));
    }

    #[test]
    fn test_lru_remove_nonexistent_key() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");

        lru.remove("nonexistent");

        assert_eq!(lru.len(), 2);
        assert!(lru.contains("key1"));
        assert!(lru.contains("key2"));
    }

    #[test]
    fn test_lru_iter_oldest_first() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // Access in a different order
        lru.touch("a");
        lru.touch("c");
        lru.touch("b");

        // touch(a): [a]
        // touch(b): [b, a]
        // touch(c): [c, b, a]
        // touch(a): [a, c, b]
        // touch(c): [c, a, b]
        // touch(b): [b, c, a]
        // Oldest-first walk: a, c, b
        let order: Vec<&String> = lru.iter_oldest_first().collect();
        assert_eq!(order, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_lru_iter_skips_removed_keys() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.remove("b");

        let order: Vec<&String> = lru.iter_oldest_first().collect();
        assert_eq!(order, vec!["a", "c"]);
        assert_eq!(lru.peek_oldest(), Some(&"a".to_string()));
    }

    #[test]
    fn test_lru_touch_same_key_multiple_times() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key1");
        lru.touch("key1");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.peek_oldest(), Some(&"key1".to_string()));
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();

        lru.touch("key1");
        lru.touch("key2");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_touch_moves_to_front() {
        let mut lru = LruTracker::new();

        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        // 'a' is oldest
        assert_eq!(lru.peek_oldest(), Some(&"a".to_string()));

        // Touch 'a' to move it to front
        lru.touch("a");

        // Now 'b' should be oldest
        assert_eq!(lru.peek_oldest(), Some(&"b".to_string()));
    }

    #[test]
    fn test_lru_compaction_bounds_queue_growth() {
        let mut lru = LruTracker::new();

        // Hammer a handful of keys; the internal queue must stay bounded by
        // the compaction threshold, not grow with the number of touches.
        for round in 0..1000 {
            lru.touch(&format!("key{}", round % 4));
        }

        assert_eq!(lru.len(), 4);
        assert!(
            lru.order.len() <= lru.live.len() * 2 + 16,
            "Queue of {} pairs was never compacted",
            lru.order.len()
        );

        // Recency order still correct after heavy churn
        assert_eq!(lru.peek_oldest(), Some(&"key0".to_string()));
    }
}
