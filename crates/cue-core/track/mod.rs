//! Cue track and region grouping
//!
//! A [`CueTrack`] accumulates the cues of one or more parses and indexes
//! them by time, so a player can ask which cues are active at an instant.
//! [`group_by_region`] arranges cues the way a renderer draws them: one
//! group per region, in the order regions are first used.
//!
//! ```rust
//! use cue_core::{track::CueTrack, ttml::{CaptionAdapter, TtmlAdapter}};
//!
//! let document = r#"<tt><body><div>
//!   <p begin="0s" end="2s">one</p>
//!   <p begin="1s" end="3s">two</p>
//! </div></body></tt>"#;
//!
//! let mut track = CueTrack::new();
//! track.add_result(TtmlAdapter::new().parse(document)?);
//! let cues = track.active_cues(1500.0);
//! let active: Vec<_> = cues.iter().map(|cue| cue.content()).collect();
//! assert_eq!(active, ["one", "two"]);
//! # Ok::<(), cue_core::CoreError>(())
//! ```

use std::{borrow::Borrow, sync::Arc};

use tracing::debug;

use crate::{
    model::{CueNode, Region},
    timing::{IntervalTree, QueryRange},
    ttml::{ParseError, ParseResult},
};

/// Group id used for cues without a region
pub const DEFAULT_GROUP: &str = "default";

/// Append-only, time-indexed cue collection
#[derive(Debug, Clone, Default)]
pub struct CueTrack {
    cues: Vec<Arc<CueNode>>,
    index: IntervalTree<Arc<CueNode>>,
    errors: Vec<ParseError>,
}

impl CueTrack {
    /// Create an empty track
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add every cue of a parse and keep its recorded errors
    pub fn add_result(&mut self, result: ParseResult) {
        debug!(cues = result.data.len(), errors = result.errors.len(), "adding parse result to track");
        result.data.into_iter().for_each(|cue| self.push(cue));
        self.errors.extend(result.errors);
    }

    /// Add one cue
    pub fn push(&mut self, cue: CueNode) {
        let cue = Arc::new(cue);
        self.index.insert(Arc::clone(&cue));
        self.cues.push(cue);
    }

    /// Cues active at `time` (milliseconds), ordered by start
    #[must_use]
    pub fn active_cues(&self, time: f64) -> Vec<Arc<CueNode>> {
        self.cues_between(time, time)
    }

    /// Cues overlapping `[low, high]`, ordered by start
    #[must_use]
    pub fn cues_between(&self, low: f64, high: f64) -> Vec<Arc<CueNode>> {
        self.index
            .query(QueryRange { low, high })
            .into_iter()
            .map(Arc::clone)
            .collect()
    }

    /// Cues in insertion order
    #[must_use]
    pub fn cues(&self) -> &[Arc<CueNode>] {
        &self.cues
    }

    /// Errors recorded by the parses added so far
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Number of cues
    #[must_use]
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Check if the track holds no cues
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

impl Extend<CueNode> for CueTrack {
    fn extend<I: IntoIterator<Item = CueNode>>(&mut self, iter: I) {
        iter.into_iter().for_each(|cue| self.push(cue));
    }
}

/// Cues sharing one region
#[derive(Debug, Clone)]
pub struct RegionGroup<C> {
    /// Region id, or [`DEFAULT_GROUP`]
    pub id: String,
    /// The shared region; `None` for the default group
    pub region: Option<Arc<Region>>,
    /// Cues in input order
    pub cues: Vec<C>,
}

/// Group cues by region id in first-seen order
///
/// Cues without a region share one group named [`DEFAULT_GROUP`].
pub fn group_by_region<C, I>(cues: I) -> Vec<RegionGroup<C>>
where
    C: Borrow<CueNode>,
    I: IntoIterator<Item = C>,
{
    let mut groups: Vec<RegionGroup<C>> = Vec::new();
    for cue in cues {
        let region = cue.borrow().region().cloned();
        let id = region.as_ref().map_or(DEFAULT_GROUP, |region| region.id());
        match groups.iter_mut().find(|group| group.id == id) {
            Some(group) => group.cues.push(cue),
            None => groups.push(RegionGroup {
                id: id.to_string(),
                region,
                cues: vec![cue],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cue(id: &str, start: f64, end: f64, region: Option<&Arc<Region>>) -> CueNode {
        CueNode::builder()
            .id(id)
            .start_time(start)
            .end_time(end)
            .content(id)
            .region(region.cloned())
            .build()
            .unwrap()
    }

    #[test]
    fn active_cues_follow_the_index() {
        let mut track = CueTrack::new();
        track.extend([
            cue("a", 0.0, 1000.0, None),
            cue("b", 500.0, f64::INFINITY, None),
            cue("c", 2000.0, 3000.0, None),
        ]);
        let ids = |cues: Vec<Arc<CueNode>>| cues.iter().map(|c| c.id().to_string()).collect::<Vec<_>>();
        assert_eq!(ids(track.active_cues(750.0)), ["a", "b"]);
        assert_eq!(ids(track.active_cues(2500.0)), ["b", "c"]);
        assert_eq!(ids(track.cues_between(1200.0, 1800.0)), ["b"]);
        assert_eq!(track.len(), 3);
    }

    #[test]
    fn add_result_keeps_errors() {
        let mut track = CueTrack::new();
        track.add_result(ParseResult {
            data: vec![cue("a", 0.0, 1.0, None)],
            errors: vec![ParseError::new(crate::CoreError::MissingContent, "")],
        });
        assert_eq!(track.errors().len(), 1);
        assert!(!track.is_empty());
    }

    #[test]
    fn groups_by_region_in_first_seen_order() {
        let top = Arc::new(Region::new("top"));
        let bottom = Arc::new(Region::new("bottom"));
        let cues = [
            cue("1", 0.0, 1.0, Some(&bottom)),
            cue("2", 0.0, 1.0, None),
            cue("3", 0.0, 1.0, Some(&top)),
            cue("4", 0.0, 1.0, Some(&bottom)),
        ];
        let groups = group_by_region(&cues);
        let summary: Vec<_> = groups
            .iter()
            .map(|group| (group.id.as_str(), group.cues.iter().map(|c| c.id()).collect::<Vec<_>>()))
            .collect();
        assert_eq!(
            summary,
            [
                ("bottom", vec!["1", "4"]),
                ("default", vec!["2"]),
                ("top", vec!["3"]),
            ]
        );
        assert!(groups[1].region.is_none());

        let shared: Vec<_> = cues.into_iter().map(Arc::new).collect();
        assert_eq!(group_by_region(shared).len(), 3);
    }
}
