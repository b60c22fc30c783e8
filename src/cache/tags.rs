//! Tag Index Module
//!
//! Secondary mapping from tag to the set of keys carrying it, used for bulk
//! lookup and bulk invalidation. The entry store keeps this index consistent
//! with the entry map on every mutation; the index holds only keys, never
//! entry data.

use std::collections::{HashMap, HashSet};

// == Tag Index ==
/// Maps each tag to the keys currently indexed under it.
#[derive(Debug, Default)]
pub struct TagIndex {
    index: HashMap<String, HashSet<String>>,
}

impl TagIndex {
    // == Constructor ==
    /// Creates a new empty tag index.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
        }
    }

    // == Insert ==
    /// Indexes a key under each of the given tags.
    pub fn insert(&mut self, key: &str, tags: &HashSet<String>) {
        for tag in tags {
            self.index
                .entry(tag.clone())
                .or_default()
                .insert(key.to_string());
        }
    }

    // == Remove ==
    /// Removes a key from each of the given tags.
    ///
    /// Tags left without any key are dropped from the index entirely.
    pub fn remove(&mut self, key: &str, tags: &HashSet<String>) {
        for tag in tags {
            if let Some(keys) = self.index.get_mut(tag) {
                keys.remove(key);
                if keys.is_empty() {
                    self.index.remove(tag);
                }
            }
        }
    }

    // == Keys Matching Any ==
    /// Returns the union of keys indexed under any of the given tags.
    pub fn keys_matching_any(&self, tags: &[String]) -> HashSet<String> {
        let mut keys = HashSet::new();
        for tag in tags {
            if let Some(tagged) = self.index.get(tag) {
                keys.extend(tagged.iter().cloned());
            }
        }
        keys
    }

    // == Keys For Tag ==
    /// Returns the keys indexed under a single tag, if any.
    pub fn keys_for(&self, tag: &str) -> Option<&HashSet<String>> {
        self.index.get(tag)
    }

    // == Clear ==
    /// Drops all tag associations.
    pub fn clear(&mut self) {
        self.index.clear();
    }

    // == Tag Count ==
    /// Returns the number of distinct tags currently indexed.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> HashSet<String> {
        names.iter().map(|t| t.to_string()).collect()
    }

    fn tag_list(names: &[&str]) -> Vec<String> {
        names.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_index_new() {
        let index = TagIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_index_insert_and_lookup() {
        let mut index = TagIndex::new();

        index.insert("k1", &tags(&["wallet", "hot"]));
        index.insert("k2", &tags(&["wallet"]));

        let keys = index.keys_matching_any(&tag_list(&["wallet"]));
        assert_eq!(keys.len(), 2);
        assert!(keys.contains("k1"));
        assert!(keys.contains("k2"));

        let keys = index.keys_matching_any(&tag_list(&["hot"]));
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("k1"));
    }

    #[test]
    fn test_index_union_across_tags() {
        let mut index = TagIndex::new();

        index.insert("k1", &tags(&["a"]));
        index.insert("k2", &tags(&["b"]));
        index.insert("k3", &tags(&["a", "b"]));

        let keys = index.keys_matching_any(&tag_list(&["a", "b"]));
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_index_remove_prunes_empty_tags() {
        let mut index = TagIndex::new();

        index.insert("k1", &tags(&["only"]));
        index.remove("k1", &tags(&["only"]));

        assert!(index.is_empty());
        assert!(index.keys_for("only").is_none());
    }

    #[test]
    fn test_index_remove_keeps_other_keys() {
        let mut index = TagIndex::new();

        index.insert("k1", &tags(&["shared"]));
        index.insert("k2", &tags(&["shared"]));
        index.remove("k1", &tags(&["shared"]));

        let keys = index.keys_matching_any(&tag_list(&["shared"]));
        assert_eq!(keys.len(), 1);
        assert!(keys.contains("k2"));
    }

    #[test]
    fn test_index_lookup_unknown_tag() {
        let index = TagIndex::new();
        assert!(index.keys_matching_any(&tag_list(&["missing"])).is_empty());
    }

    #[test]
    fn test_index_clear() {
        let mut index = TagIndex::new();

        index.insert("k1", &tags(&["a"]));
        index.insert("k2", &tags(&["b"]));
        index.clear();

        assert!(index.is_empty());
    }
}
