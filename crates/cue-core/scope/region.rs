//! Region container context: the raw region declarations under `<layout>`
//!
//! Declarations stay unparsed here. The adapter turns a definition into a
//! [`crate::model::Region`] the first time a cue refers to it.

use std::sync::Arc;

use crate::{
    model::TtmlStyle,
    tokenizer::Token,
    utils::{create_hash_map, FastHashMap},
};

/// One `<region>` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDefinition {
    /// `xml:id` of the region
    pub id: String,
    /// The declaring start tag, attributes untouched
    pub element: Token,
    /// Styles declared by nested `<style>` children, in order
    pub nested_styles: Vec<Arc<TtmlStyle>>,
}

impl RegionDefinition {
    /// Create a definition without nested styles
    #[must_use]
    pub fn new(id: impl Into<String>, element: Token) -> Self {
        Self {
            id: id.into(),
            element,
            nested_styles: Vec::new(),
        }
    }

    /// Attach styles of nested `<style>` children
    #[must_use]
    pub fn with_nested_styles(mut self, styles: Vec<Arc<TtmlStyle>>) -> Self {
        self.nested_styles = styles;
        self
    }
}

/// Region declarations visible from a scope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionContainerContext {
    definitions: Vec<RegionDefinition>,
    index: FastHashMap<String, usize>,
}

impl RegionContainerContext {
    /// Create a container; later duplicates of an id are dropped
    #[must_use]
    pub fn new(definitions: Vec<RegionDefinition>) -> Self {
        let mut container = Self {
            definitions: Vec::with_capacity(definitions.len()),
            index: create_hash_map(),
        };
        container.extend(definitions);
        container
    }

    /// Look up a declaration by id
    #[must_use]
    pub fn definition(&self, id: &str) -> Option<&RegionDefinition> {
        self.index.get(id).map(|&position| &self.definitions[position])
    }

    /// Declarations in document order
    #[must_use]
    pub fn definitions(&self) -> &[RegionDefinition] {
        &self.definitions
    }

    /// Check if a region id is declared
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Number of declarations
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if nothing is declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Add the declarations of a later `<layout>` block
    ///
    /// Ids that are already declared keep their first definition.
    pub fn merge_with(&mut self, other: Self) {
        self.extend(other.definitions);
    }

    fn extend(&mut self, definitions: Vec<RegionDefinition>) {
        for definition in definitions {
            if self.index.contains_key(&definition.id) {
                continue;
            }
            self.index.insert(definition.id.clone(), self.definitions.len());
            self.definitions.push(definition);
        }
    }
}
