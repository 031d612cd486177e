//! Per-key memoization of resolved attribute values.
//!
//! A cache entry is explicitly marked stale (never eagerly recomputed) when
//! a change notification fires for its key; the next read re-resolves.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::resolve::ResolvedValue;

enum CacheEntry {
    Fresh(ResolvedValue),
    Stale,
}

/// Resolved-value cache keyed by attribute name.
#[derive(Default)]
pub struct ResolvedCache {
    entries: RefCell<HashMap<String, CacheEntry>>,
}

impl ResolvedCache {
    /// Returns the cached value for `key` unless it is absent or stale.
    pub fn get(&self, key: &str) -> Option<ResolvedValue> {
        match self.entries.borrow().get(key) {
            Some(CacheEntry::Fresh(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Stores a freshly-resolved value for `key`.
    pub fn insert(&self, key: &str, value: ResolvedValue) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), CacheEntry::Fresh(value));
    }

    /// Marks the entry for `key` stale, if one exists.
    pub fn invalidate(&self, key: &str) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(key) {
            *entry = CacheEntry::Stale;
        }
    }

    /// True if `key` has an entry that has been invalidated.
    pub fn is_stale(&self, key: &str) -> bool {
        matches!(self.entries.borrow().get(key), Some(CacheEntry::Stale))
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}
