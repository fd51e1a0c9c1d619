//! The `require` module cache.
//!
//! Entries are inserted *before* a module's body runs, so a circular
//! `require` sees the in-progress (possibly incomplete) `module.exports`
//! object rather than recursing. An entry is removed entirely if the
//! module body throws, so a later `require` of the same path retries from
//! scratch rather than caching the failure.

use std::cell::RefCell;
use std::collections::VecDeque;

use boa_engine::JsValue;
use rustc_hash::FxHashMap;

/// Past this many distinct modules, the oldest (by first `require`, not by
/// last use) is evicted to make room for a new entry. A module still mid-
/// load is never evicted, since dropping it would break a circular
/// `require` currently observing its partial `exports`.
const MAX_ENTRIES: usize = 1024;

struct ModuleRecord {
    exports: JsValue,
    loading: bool,
}

#[derive(Default)]
pub struct ModuleCache {
    entries: RefCell<FxHashMap<String, ModuleRecord>>,
    /// First-seen order of paths currently in `entries`, oldest first.
    order: RefCell<VecDeque<String>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evicts the oldest non-loading entry, if any, to bring the cache back
    /// under [`MAX_ENTRIES`]. A cache saturated entirely with in-progress
    /// (circular) loads is left over budget rather than corrupted.
    fn evict_oldest_if_full(&self, entries: &mut FxHashMap<String, ModuleRecord>) {
        let mut order = self.order.borrow_mut();
        while entries.len() >= MAX_ENTRIES {
            let Some(victim) = order.iter().position(|path| !entries.get(path).map(|e| e.loading).unwrap_or(false))
            else {
                break;
            };
            let path = order.remove(victim).unwrap();
            entries.remove(&path);
        }
    }

    /// Returns the cached `exports` value for `path`, whether or not the
    /// module has finished loading.
    pub fn get(&self, path: &str) -> Option<JsValue> {
        self.entries.borrow().get(path).map(|e| e.exports.clone())
    }

    pub fn is_loading(&self, path: &str) -> bool {
        self.entries.borrow().get(path).map(|e| e.loading).unwrap_or(false)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.borrow().contains_key(path)
    }

    /// Inserts the cache entry for `path` before the module body executes,
    /// so a cycle back into `path` observes `initial_exports` instead of
    /// re-running the body.
    pub fn begin_loading(&self, path: &str, initial_exports: JsValue) {
        let mut entries = self.entries.borrow_mut();
        if !entries.contains_key(path) {
            self.evict_oldest_if_full(&mut entries);
            self.order.borrow_mut().push_back(path.to_string());
        }
        entries.insert(
            path.to_string(),
            ModuleRecord {
                exports: initial_exports,
                loading: true,
            },
        );
    }

    /// Marks `path` as finished loading, recording whatever `module.exports`
    /// ended up pointing to (the body may have reassigned it wholesale, as
    /// with `module.exports = ...`).
    pub fn finish_loading(&self, path: &str, final_exports: JsValue) {
        self.entries.borrow_mut().insert(
            path.to_string(),
            ModuleRecord {
                exports: final_exports,
                loading: false,
            },
        );
    }

    /// Drops the entry for `path` entirely. Called when a module body
    /// throws, so the next `require` re-executes it rather than returning
    /// a half-built `exports` object forever.
    pub fn remove(&self, path: &str) {
        self.entries.borrow_mut().remove(path);
        self.order.borrow_mut().retain(|p| p != path);
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
        self.order.borrow_mut().clear();
    }
}
