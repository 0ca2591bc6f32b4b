//! Rendering regions

use std::sync::Arc;

use super::style::TtmlStyle;

/// A named rendering area
///
/// Out-of-line regions come from `<layout>` and can be shared by many cues;
/// inline regions are declared inside content and used once. Cues hold
/// regions through `Arc`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Region {
    id: String,
    timing: Option<(f64, f64)>,
    styles: Vec<Arc<TtmlStyle>>,
    inline: bool,
}

impl Region {
    /// Create an untimed, unstyled out-of-line region
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timing: None,
            styles: Vec::new(),
            inline: false,
        }
    }

    /// Attach an active interval
    #[must_use]
    pub fn with_timing(mut self, begin: f64, end: f64) -> Self {
        self.timing = Some((begin, end));
        self
    }

    /// Attach styles in application order
    #[must_use]
    pub fn with_styles(mut self, styles: Vec<Arc<TtmlStyle>>) -> Self {
        self.styles = styles;
        self
    }

    /// Mark as declared inside content
    #[must_use]
    pub fn inline(mut self) -> Self {
        self.inline = true;
        self
    }

    /// Region id
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Active interval when the region carries timing of its own
    #[must_use]
    pub const fn timing(&self) -> Option<(f64, f64)> {
        self.timing
    }

    /// Styles applied to the region, outermost first
    #[must_use]
    pub fn styles(&self) -> &[Arc<TtmlStyle>] {
        &self.styles
    }

    /// Check if the region was declared inline
    #[must_use]
    pub const fn is_inline(&self) -> bool {
        self.inline
    }
}
