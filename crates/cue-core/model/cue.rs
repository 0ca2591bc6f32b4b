//! Cue nodes and inline entities
//!
//! A [`CueNode`] is immutable once built. Derived cues (a paragraph split by
//! a timed span) are made with [`CueNode::to_builder`], which copies every
//! field so the caller only overrides what differs.
//!
//! ```rust
//! use cue_core::model::{CueNode, Entity, EntityKind};
//!
//! let base = CueNode::builder()
//!     .id("p1")
//!     .start_time(1000.0)
//!     .end_time(2000.0)
//!     .content("Hello world")
//!     .entity(Entity::new(EntityKind::Span, 6, 5))
//!     .build()?;
//!
//! let later = base.to_builder().id_suffix(1).start_time(2000.0).end_time(3000.0).build()?;
//! assert_eq!(later.id(), "p1-1");
//! assert_eq!(later.content(), "Hello world");
//! # Ok::<(), cue_core::CoreError>(())
//! ```

use core::cmp::Reverse;
use std::sync::Arc;

use super::{region::Region, style::TtmlStyle};
use crate::{timing::IntervalNode, utils::CoreError, Result};

/// Kind of inline markup an entity stands for
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EntityKind {
    /// Styled `<span>`
    Span,
    /// Ruby container or base (`tts:ruby="container"` / `"base"`)
    Ruby,
    /// Ruby annotation text (`tts:ruby="text"`)
    RubyText,
    /// Span spoken by an agent (`ttm:agent`)
    Voice(String),
    /// `<br/>`
    LineBreak,
}

/// Inline markup range inside a cue's content
///
/// `offset` and `length` are byte positions into [`CueNode::content`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Entity {
    /// What the markup is
    pub kind: EntityKind,
    /// Start byte offset
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Styles applied by the markup
    pub styles: Vec<Arc<TtmlStyle>>,
    /// `xml:lang` of the markup
    pub lang: Option<String>,
}

impl Entity {
    /// Create an unstyled entity
    #[must_use]
    pub const fn new(kind: EntityKind, offset: usize, length: usize) -> Self {
        Self {
            kind,
            offset,
            length,
            styles: Vec::new(),
            lang: None,
        }
    }

    /// End byte offset (exclusive)
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Sort entities so that outer markup precedes inner markup
///
/// Ascending offset; for equal offsets the longer entity first. The sort is
/// stable, so identical ranges keep their opening order.
pub fn sort_entities(entities: &mut [Entity]) {
    entities.sort_by_key(|entity| (entity.offset, Reverse(entity.length)));
}

/// A timed unit of caption content
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CueNode {
    id: String,
    start_time: f64,
    end_time: f64,
    content: String,
    entities: Vec<Entity>,
    region: Option<Arc<Region>>,
    styles: Vec<Arc<TtmlStyle>>,
}

impl CueNode {
    /// Start building a cue
    #[must_use]
    pub fn builder() -> CueNodeBuilder {
        CueNodeBuilder::default()
    }

    /// Builder pre-filled with every field of this cue
    #[must_use]
    pub fn to_builder(&self) -> CueNodeBuilder {
        CueNodeBuilder {
            id: self.id.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content.clone(),
            entities: self.entities.clone(),
            region: self.region.clone(),
            styles: self.styles.clone(),
        }
    }

    /// Cue id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Start in milliseconds
    #[must_use]
    pub const fn start_time(&self) -> f64 {
        self.start_time
    }

    /// End in milliseconds, possibly infinite
    #[must_use]
    pub const fn end_time(&self) -> f64 {
        self.end_time
    }

    /// Text content, lines separated by `\n`
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Inline markup, outer before inner
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Region the cue is presented in
    #[must_use]
    pub fn region(&self) -> Option<&Arc<Region>> {
        self.region.as_ref()
    }

    /// Container styles (body, div, p), outermost first
    #[must_use]
    pub fn styles(&self) -> &[Arc<TtmlStyle>] {
        &self.styles
    }

    /// Check if the cue is active at `time`
    #[must_use]
    pub fn is_active_at(&self, time: f64) -> bool {
        self.start_time <= time && time <= self.end_time
    }

    /// Text covered by an entity
    #[must_use]
    pub fn entity_text(&self, entity: &Entity) -> Option<&str> {
        self.content.get(entity.offset..entity.end())
    }
}

impl IntervalNode for CueNode {
    fn low(&self) -> f64 {
        self.start_time
    }

    fn high(&self) -> f64 {
        self.end_time
    }
}

/// Builder for [`CueNode`]
#[derive(Debug, Clone, Default)]
pub struct CueNodeBuilder {
    id: String,
    start_time: f64,
    end_time: f64,
    content: String,
    entities: Vec<Entity>,
    region: Option<Arc<Region>>,
    styles: Vec<Arc<TtmlStyle>>,
}

impl CueNodeBuilder {
    /// Set the id
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Append `-n` to the current id
    #[must_use]
    pub fn id_suffix(mut self, n: usize) -> Self {
        self.id = format!("{}-{n}", self.id);
        self
    }

    /// Set the start time in milliseconds
    #[must_use]
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = start_time;
        self
    }

    /// Set the end time in milliseconds
    #[must_use]
    pub fn end_time(mut self, end_time: f64) -> Self {
        self.end_time = end_time;
        self
    }

    /// Set the text content
    #[must_use]
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Replace all entities
    #[must_use]
    pub fn entities(mut self, entities: Vec<Entity>) -> Self {
        self.entities = entities;
        self
    }

    /// Add one entity
    #[must_use]
    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Set or clear the region
    #[must_use]
    pub fn region(mut self, region: Option<Arc<Region>>) -> Self {
        self.region = region;
        self
    }

    /// Replace container styles
    #[must_use]
    pub fn styles(mut self, styles: Vec<Arc<TtmlStyle>>) -> Self {
        self.styles = styles;
        self
    }

    /// Build the cue, sorting entities
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOutput`] when the start time is not
    /// finite, the end precedes the start, or an entity reaches past the
    /// content.
    pub fn build(mut self) -> Result<CueNode> {
        if !self.start_time.is_finite() {
            return Err(CoreError::InvalidOutput(format!(
                "cue '{}' has a non-finite start time",
                self.id
            )));
        }
        if self.end_time < self.start_time {
            return Err(CoreError::InvalidOutput(format!(
                "cue '{}' ends before it starts",
                self.id
            )));
        }
        if let Some(entity) = self.entities.iter().find(|e| e.end() > self.content.len()) {
            return Err(CoreError::InvalidOutput(format!(
                "entity at {}..{} lies outside cue '{}'",
                entity.offset,
                entity.end(),
                self.id
            )));
        }

        sort_entities(&mut self.entities);
        Ok(CueNode {
            id: self.id,
            start_time: self.start_time,
            end_time: self.end_time,
            content: self.content,
            entities: self.entities,
            region: self.region,
            styles: self.styles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_sorted_outer_first() {
        let cue = CueNode::builder()
            .content("abcdef")
            .end_time(1.0)
            .entity(Entity::new(EntityKind::Span, 2, 1))
            .entity(Entity::new(EntityKind::RubyText, 0, 2))
            .entity(Entity::new(EntityKind::Ruby, 0, 4))
            .build()
            .unwrap();
        let order: Vec<_> = cue.entities().iter().map(|e| (e.offset, e.length)).collect();
        assert_eq!(order, [(0, 4), (0, 2), (2, 1)]);
    }

    #[test]
    fn equal_ranges_keep_opening_order() {
        let mut entities = vec![
            Entity::new(EntityKind::Voice("a".into()), 0, 3),
            Entity::new(EntityKind::Span, 0, 3),
        ];
        sort_entities(&mut entities);
        assert_eq!(entities[0].kind, EntityKind::Voice("a".into()));
    }

    #[test]
    fn rejects_bad_output() {
        let err = CueNode::builder()
            .start_time(f64::NAN)
            .build()
            .unwrap_err();
        assert!(err.is_critical());

        assert!(CueNode::builder().start_time(5.0).end_time(1.0).build().is_err());
        assert!(CueNode::builder()
            .content("ab")
            .end_time(1.0)
            .entity(Entity::new(EntityKind::Span, 1, 5))
            .build()
            .is_err());
    }

    #[test]
    fn builder_copy_overrides_only_given_fields() {
        let base = CueNode::builder()
            .id("p")
            .start_time(0.0)
            .end_time(f64::INFINITY)
            .content("x")
            .region(Some(Arc::new(Region::new("r1"))))
            .build()
            .unwrap();
        let copy = base.to_builder().content("y").id_suffix(2).build().unwrap();
        assert_eq!(copy.id(), "p-2");
        assert_eq!(copy.content(), "y");
        assert_eq!(copy.region().map(|r| r.id()), Some("r1"));
        assert!(copy.is_active_at(1e12));
        assert_eq!(copy.entity_text(&Entity::new(EntityKind::Span, 0, 1)), Some("y"));
    }
}
