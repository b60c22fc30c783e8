//! Eviction Policy Module
//!
//! Pure victim selection, run after every set and every sweep cycle.
//! Two successive passes:
//!
//! 1. Count pass: while the entry count exceeds the limit, pick the least
//!    recently used key (recency queue order; insertion order already breaks
//!    creation-time ties).
//! 2. Memory pass: while the aggregate size exceeds the limit, pick the
//!    largest remaining entry, ties broken by least recent access. A cache
//!    holding a few very large entries must shed by size, not just by count.
//!
//! Callers may protect one key (the one just inserted); it is skipped by both
//! passes. That never leaves the cache over budget: set rejects any value
//! larger than the memory limit up front, so once everything else is gone the
//! protected entry fits on its own.

use std::collections::{HashMap, HashSet};

use crate::cache::{CacheEntry, LruTracker};

// == Select Victims ==
/// Plans the removals needed to bring the cache back within both limits.
///
/// Does not mutate anything; returns keys in removal order. The entry store
/// performs the actual removals and records the evictions.
pub fn select_victims(
    entries: &HashMap<String, CacheEntry>,
    lru: &LruTracker,
    total_size_bytes: u64,
    max_entries: usize,
    max_memory_bytes: u64,
    protected: Option<&str>,
) -> Vec<String> {
    let mut victims: Vec<String> = Vec::new();
    let mut doomed: HashSet<&str> = HashSet::new();
    let mut count = entries.len();
    let mut size = total_size_bytes;

    // Pass 1: count-based LRU
    for key in lru.iter_oldest_first() {
        if count <= max_entries {
            break;
        }
        if Some(key.as_str()) == protected || doomed.contains(key.as_str()) {
            continue;
        }
        if let Some(entry) = entries.get(key) {
            doomed.insert(key.as_str());
            victims.push(key.clone());
            count -= 1;
            size = size.saturating_sub(entry.size_bytes);
        }
    }

    // Pass 2: memory-based, largest first
    while size > max_memory_bytes {
        let candidate = largest_remaining(entries, lru, &doomed, protected);
        match candidate {
            Some(key) => {
                let entry = &entries[key];
                size = size.saturating_sub(entry.size_bytes);
                victims.push(key.to_string());
                doomed.insert(key);
            }
            None => break,
        }
    }

    victims
}

// == Largest Remaining ==
/// Finds the largest surviving entry, preferring the least recently used on
/// equal sizes. Walking the recency queue oldest-first makes the first
/// maximum encountered the correct tie-break winner.
fn largest_remaining<'a>(
    entries: &'a HashMap<String, CacheEntry>,
    lru: &'a LruTracker,
    doomed: &HashSet<&str>,
    protected: Option<&str>,
) -> Option<&'a str> {
    let mut best: Option<(&str, u64)> = None;

    for key in lru.iter_oldest_first() {
        if Some(key.as_str()) == protected || doomed.contains(key.as_str()) {
            continue;
        }
        if let Some(entry) = entries.get(key) {
            match best {
                Some((_, best_size)) if entry.size_bytes <= best_size => {}
                _ => best = Some((key.as_str(), entry.size_bytes)),
            }
        }
    }

    best.map(|(key, _)| key)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(entries: &[(&str, usize)]) -> (HashMap<String, CacheEntry>, LruTracker, u64) {
        let mut map = HashMap::new();
        let mut lru = LruTracker::new();
        let mut total = 0u64;

        for (key, size) in entries {
            let entry = CacheEntry::new(vec![0u8; *size], None, HashSet::new());
            total += entry.size_bytes;
            map.insert(key.to_string(), entry);
            lru.touch(key);
        }

        (map, lru, total)
    }

    #[test]
    fn test_no_victims_within_limits() {
        let (map, lru, total) = fixture(&[("a", 10), ("b", 10)]);

        let victims = select_victims(&map, &lru, total, 10, 1000, None);
        assert!(victims.is_empty());
    }

    #[test]
    fn test_count_pass_evicts_least_recently_used() {
        let (map, mut lru, total) = fixture(&[("a", 10), ("b", 10), ("c", 10)]);
        // Make 'a' most recently used; 'b' becomes the LRU candidate
        lru.touch("a");

        let victims = select_victims(&map, &lru, total, 2, 1000, None);
        assert_eq!(victims, vec!["b".to_string()]);
    }

    #[test]
    fn test_count_pass_evicts_multiple() {
        let (map, lru, total) = fixture(&[("a", 10), ("b", 10), ("c", 10), ("d", 10)]);

        let victims = select_victims(&map, &lru, total, 2, 1000, None);
        assert_eq!(victims, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_memory_pass_evicts_largest_first() {
        let (map, lru, total) = fixture(&[("small", 10), ("large", 80), ("mid", 40)]);

        // Count is fine (3 <= 10) but 130 bytes exceed 100
        let victims = select_victims(&map, &lru, total, 10, 100, None);
        assert_eq!(victims, vec!["large".to_string()]);
    }

    #[test]
    fn test_memory_pass_tie_broken_by_recency() {
        let (map, mut lru, total) = fixture(&[("x", 60), ("y", 60)]);
        // 'y' accessed last, so 'x' is the least recently used of the tie
        lru.touch("y");

        let victims = select_victims(&map, &lru, total, 10, 100, None);
        assert_eq!(victims, vec!["x".to_string()]);
    }

    #[test]
    fn test_protected_key_survives_both_passes() {
        let (map, lru, total) = fixture(&[("old", 90), ("new", 90)]);

        let victims = select_victims(&map, &lru, total, 1, 100, Some("new"));
        assert_eq!(victims, vec!["old".to_string()]);
    }

    #[test]
    fn test_passes_compose() {
        // Count pass drops the two oldest, then memory pass drops the largest
        // of what remains.
        let (map, lru, total) =
            fixture(&[("a", 10), ("b", 10), ("c", 90), ("d", 30), ("e", 20)]);

        let victims = select_victims(&map, &lru, total, 3, 60, None);
        assert_eq!(
            victims,
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_memory_pass_stops_when_empty() {
        let (map, lru, total) = fixture(&[("only", 50)]);

        // Impossible budget, protected entry is all that remains
        let victims = select_victims(&map, &lru, total, 10, 10, Some("only"));
        assert!(victims.is_empty());
    }
}
