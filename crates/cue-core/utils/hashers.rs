//! Hash map helpers backed by ahash
//!
//! Attribute maps, memo caches and id indexes are all small, short-lived
//! and keyed by strings, so they share one hasher choice.

use ahash::RandomState;
use std::collections::HashMap;

/// `HashMap` using the crate-wide ahash state
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

/// Create a new `HashMap` with the crate-wide hasher
///
/// # Example
///
/// ```rust
/// use cue_core::utils::hashers::create_hash_map;
///
/// let mut map = create_hash_map::<String, i32>();
/// map.insert("key".to_string(), 42);
/// ```
#[must_use]
pub fn create_hash_map<K, V>() -> FastHashMap<K, V> {
    HashMap::with_hasher(RandomState::new())
}

/// Create a new `HashMap` with specific capacity and the crate-wide hasher
#[must_use]
pub fn create_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    HashMap::with_capacity_and_hasher(capacity, RandomState::new())
}
