//! Adapter configuration

use crate::timing::TimeDetails;

/// Default limit on element nesting
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 256;

/// Options controlling how a TTML document is turned into cues
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterOptions {
    /// Timing parameters used where the document does not set its own
    pub default_time_details: TimeDetails,
    /// Split a paragraph into several cues when spans carry their own timing
    pub split_timed_spans: bool,
    /// Elements nested deeper than this are ignored
    pub max_nesting_depth: usize,
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self {
            default_time_details: TimeDetails::default(),
            split_timed_spans: true,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

impl AdapterOptions {
    /// Set fallback timing parameters.
    #[must_use]
    pub fn with_time_details(mut self, details: TimeDetails) -> Self {
        self.default_time_details = details;
        self
    }

    /// Enable or disable splitting on timed spans.
    #[must_use]
    pub fn with_split_timed_spans(mut self, enabled: bool) -> Self {
        self.split_timed_spans = enabled;
        self
    }

    /// Set the nesting limit.
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimeBase;

    #[test]
    fn builders_override_defaults() {
        let options = AdapterOptions::default()
            .with_split_timed_spans(false)
            .with_max_nesting_depth(8)
            .with_time_details(TimeDetails::default().with_time_base(TimeBase::Clock));
        assert!(!options.split_timed_spans);
        assert_eq!(options.max_nesting_depth, 8);
        assert_eq!(options.default_time_details.time_base, TimeBase::Clock);
        assert!(AdapterOptions::default().split_timed_spans);
    }
}
