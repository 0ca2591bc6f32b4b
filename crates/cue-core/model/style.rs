//! Resolved styles
//!
//! A [`TtmlStyle`] is a flat map of `tts:*` attributes. Referential chains
//! (`style="a b"`) are already folded in by the time a style reaches a cue,
//! so renderers never need to follow ids.

use crate::{
    tokenizer::Attributes,
    utils::{create_hash_map, FastHashMap},
};

/// Prefix of styling attributes
pub const STYLE_PREFIX: &str = "tts:";

/// A named set of `tts:*` attributes
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TtmlStyle {
    id: String,
    attributes: FastHashMap<String, String>,
}

impl TtmlStyle {
    /// Create a style without attributes
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: create_hash_map(),
        }
    }

    /// Create a style from the `tts:*` entries of an attribute list
    #[must_use]
    pub fn from_attributes(id: impl Into<String>, attributes: &Attributes) -> Self {
        let mut style = Self::new(id);
        for (name, value) in attributes.with_prefix(STYLE_PREFIX) {
            style.set(name, value);
        }
        style
    }

    /// Style id, after any collision renaming
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get one attribute
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Set one attribute, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Fold `other` underneath this style
    ///
    /// Attributes already present here win; missing ones are copied.
    pub fn inherit_from(&mut self, other: &Self) {
        for (name, value) in &other.attributes {
            self.attributes
                .entry(name.clone())
                .or_insert_with(|| value.clone());
        }
    }

    /// Attribute map
    #[must_use]
    pub const fn attributes(&self) -> &FastHashMap<String, String> {
        &self.attributes
    }

    /// Attributes sorted by name, for stable output
    #[must_use]
    pub fn sorted_attributes(&self) -> Vec<(&str, &str)> {
        let mut sorted: Vec<_> = self
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();
        sorted.sort_unstable();
        sorted
    }

    /// Number of attributes
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the style sets nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_styling_attributes_are_kept() {
        let attributes: Attributes = [("xml:id", "s1"), ("tts:color", "red"), ("style", "s0")]
            .into_iter()
            .collect();
        let style = TtmlStyle::from_attributes("s1", &attributes);
        assert_eq!(style.sorted_attributes(), [("tts:color", "red")]);
    }

    #[test]
    fn inherit_keeps_own_values() {
        let mut own = TtmlStyle::new("child");
        own.set("tts:color", "red");
        let mut parent = TtmlStyle::new("parent");
        parent.set("tts:color", "blue");
        parent.set("tts:fontSize", "2c");
        own.inherit_from(&parent);
        assert_eq!(own.get("tts:color"), Some("red"));
        assert_eq!(own.get("tts:fontSize"), Some("2c"));
        assert_eq!(own.len(), 2);
    }
}
