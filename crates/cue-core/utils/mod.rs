//! Shared utilities: error types, hashing helpers and attribute splitting

pub mod errors;
pub mod hashers;

pub use errors::{CoreError, Result};
pub use hashers::{create_hash_map, FastHashMap};

/// Split an attribute value holding a whitespace separated id list
pub fn split_idrefs(value: &str) -> impl Iterator<Item = &str> {
    value.split_ascii_whitespace()
}
