//! Content-hash-keyed transform cache, bounded by entry count (LRU
//! eviction). Keyed on `(path, hash)`: a cache hit requires both the
//! path and the content hash of the current source to match, so an
//! edited file misses even if another file at a different path happens
//! to hash the same.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use rustc_hash::{FxHashMap, FxHasher};

/// A fast, non-cryptographic hash of transform input -- this is a cache
/// key, not a security boundary, so `FxHasher` (already used for every
/// other hash map in this workspace) is the right tool over something
/// like SHA-256.
pub fn content_hash(content: &str) -> u64 {
    let mut hasher = FxHasher::default();
    content.hash(&mut hasher);
    hasher.finish()
}

struct CacheEntry<V> {
    hash: u64,
    value: V,
}

pub struct TransformCache<V> {
    capacity: usize,
    entries: RefCell<FxHashMap<String, CacheEntry<V>>>,
    order: RefCell<VecDeque<String>>,
}

impl<V: Clone> TransformCache<V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: RefCell::new(FxHashMap::default()),
            order: RefCell::new(VecDeque::new()),
        }
    }

    /// Returns the cached value for `path` if present and its stored
    /// hash matches `hash`.
    pub fn get(&self, path: &str, hash: u64) -> Option<V> {
        let hit = self
            .entries
            .borrow()
            .get(path)
            .filter(|e| e.hash == hash)
            .map(|e| e.value.clone());
        if hit.is_some() {
            self.touch(path);
        }
        hit
    }

    pub fn insert(&self, path: &str, hash: u64, value: V) {
        {
            let mut entries = self.entries.borrow_mut();
            entries.insert(path.to_string(), CacheEntry { hash, value });
        }
        self.touch(path);
        self.evict_if_over_capacity();
    }

    fn touch(&self, path: &str) {
        let mut order = self.order.borrow_mut();
        if let Some(pos) = order.iter().position(|p| p == path) {
            order.remove(pos);
        }
        order.push_back(path.to_string());
    }

    fn evict_if_over_capacity(&self) {
        let mut entries = self.entries.borrow_mut();
        let mut order = self.order.borrow_mut();
        while entries.len() > self.capacity {
            let Some(oldest) = order.pop_front() else { break };
            entries.remove(&oldest);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_requires_matching_path_and_hash() {
        let cache: TransformCache<String> = TransformCache::new(8);
        let hash = content_hash("const x = 1;");
        cache.insert("/a.js", hash, "var x = 1;".to_string());
        assert_eq!(cache.get("/a.js", hash), Some("var x = 1;".to_string()));
        assert_eq!(cache.get("/a.js", content_hash("const x = 2;")), None);
        assert_eq!(cache.get("/b.js", hash), None);
    }

    #[test]
    fn evicts_least_recently_used_entry_over_capacity() {
        let cache: TransformCache<String> = TransformCache::new(2);
        cache.insert("/a.js", 1, "a".to_string());
        cache.insert("/b.js", 2, "b".to_string());
        cache.insert("/c.js", 3, "c".to_string());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("/a.js", 1), None);
        assert!(cache.get("/b.js", 2).is_some());
        assert!(cache.get("/c.js", 3).is_some());
    }

    #[test]
    fn reading_an_entry_protects_it_from_eviction() {
        let cache: TransformCache<String> = TransformCache::new(2);
        cache.insert("/a.js", 1, "a".to_string());
        cache.insert("/b.js", 2, "b".to_string());
        cache.get("/a.js", 1);
        cache.insert("/c.js", 3, "c".to_string());
        assert!(cache.get("/a.js", 1).is_some());
        assert_eq!(cache.get("/b.js", 2), None);
    }
}
