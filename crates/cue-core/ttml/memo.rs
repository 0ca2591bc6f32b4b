//! Per-parse memoization keyed by element id

use crate::{
    utils::{create_hash_map, CoreError, FastHashMap},
    Result,
};

/// Id-keyed cache guaranteeing at-most-once construction
///
/// Owned by a single parse; nothing is shared between parses.
#[derive(Debug, Clone)]
pub struct MemoCache<V> {
    entries: FastHashMap<String, V>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> MemoCache<V> {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: create_hash_map(),
        }
    }

    /// Cached value for `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    /// Check if `key` was already processed
    #[must_use]
    pub fn is_occupied(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Store a value, returning the one it replaces
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.entries.insert(key.into(), value)
    }

    /// Cached value, or the result of `build` stored under `key`
    ///
    /// `build` runs only when `key` is vacant. A failed build stores
    /// nothing, so a later call may try again.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `build`.
    pub fn get_or_try_insert_with<F>(&mut self, key: &str, build: F) -> Result<&V>
    where
        F: FnOnce() -> Result<V>,
    {
        if !self.entries.contains_key(key) {
            let value = build()?;
            self.entries.insert(key.to_string(), value);
        }
        self.entries
            .get(key)
            .ok_or_else(|| CoreError::internal("memoized entry vanished"))
    }

    /// Number of cached entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
