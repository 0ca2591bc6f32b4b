//! Timing context
//!
//! Stores the raw timing attributes of one element, already converted to
//! milliseconds. Derived values (start, end, container) are computed on
//! demand by [`super::ScopeTree`] by walking the context parent chain, so a
//! later merge into an ancestor is seen by every descendant.

use core::{fmt, str::FromStr};

use super::{Context, ContextFactory};
use crate::{
    timing::{parse_time_string, MarkerMode, TimeBase, TimeDetails},
    tokenizer::Attributes,
    utils::CoreError,
    Result,
};

/// How children of an element are scheduled (`timeContainer`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TimeContainer {
    /// Children run in parallel
    #[default]
    Par,
    /// Children run one after another
    Seq,
}

impl FromStr for TimeContainer {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "par" => Ok(Self::Par),
            "seq" => Ok(Self::Seq),
            other => Err(CoreError::InvalidAttribute {
                attribute: "timeContainer".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TimeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Par => "par",
            Self::Seq => "seq",
        })
    }
}

/// Raw timing of one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeContext {
    /// Resolved `begin`, already offset by the parent's start
    pub begin: Option<f64>,
    /// Resolved `end`, already offset by the parent's start
    pub end: Option<f64>,
    /// `dur` as a length
    pub dur: Option<f64>,
    /// Own `timeContainer`
    pub time_container: Option<TimeContainer>,
}

impl TimeContext {
    /// Check if no timing attribute was set
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin.is_none() && self.end.is_none() && self.dur.is_none() && self.time_container.is_none()
    }

    /// Check if `begin`, `end` or `dur` was set
    #[must_use]
    pub const fn has_timing(&self) -> bool {
        self.begin.is_some() || self.end.is_some() || self.dur.is_some()
    }

    /// Overwrite fields that `other` sets
    pub fn merge_with(&mut self, other: Self) {
        if other.begin.is_some() {
            self.begin = other.begin;
        }
        if other.end.is_some() {
            self.end = other.end;
        }
        if other.dur.is_some() {
            self.dur = other.dur;
        }
        if other.time_container.is_some() {
            self.time_container = other.time_container;
        }
    }

    /// Read `begin`, `end`, `dur` and `timeContainer`
    ///
    /// `begin` and `end` are measured from `reference_begin`, the start of
    /// the parent; `dur` is a plain length. Returns `None` when the element
    /// carries none of the four attributes.
    ///
    /// # Errors
    ///
    /// Propagates time expression errors, rejects unknown container
    /// keywords, and returns [`CoreError::DisallowedAttribute`] for `dur`
    /// under the `smpte` time base with discontinuous markers.
    pub fn from_attributes(
        attributes: &Attributes,
        details: &TimeDetails,
        reference_begin: f64,
    ) -> Result<Option<Self>> {
        let dur = attributes.get("dur");
        if dur.is_some()
            && details.time_base == TimeBase::Smpte
            && details.marker_mode == MarkerMode::Discontinuous
        {
            return Err(CoreError::DisallowedAttribute {
                attribute: "dur".to_string(),
                reason: "smpte time codes with discontinuous markers have no durations".to_string(),
            });
        }

        let context = Self {
            begin: attributes
                .get("begin")
                .map(|value| parse_time_string(value, details, reference_begin))
                .transpose()?,
            end: attributes
                .get("end")
                .map(|value| parse_time_string(value, details, reference_begin))
                .transpose()?,
            dur: dur
                .map(|value| parse_time_string(value, details, 0.0))
                .transpose()?,
            time_container: attributes
                .get("timeContainer")
                .map(str::parse)
                .transpose()?,
        };

        Ok((!context.is_empty()).then_some(context))
    }
}

/// Active end of an interval
///
/// - no `end`: `start + dur`, else unbounded in a `par` container and `0` in
///   a `seq` container
/// - `end` and `dur`: the tighter of the two, `start + min(dur, end - start)`
/// - only `end`: `end` as given
#[must_use]
pub fn active_end(start: f64, end: Option<f64>, dur: Option<f64>, container: TimeContainer) -> f64 {
    match (end, dur) {
        (None, Some(dur)) => start + dur,
        (None, None) => match container {
            TimeContainer::Par => f64::INFINITY,
            TimeContainer::Seq => 0.0,
        },
        (Some(end), Some(dur)) => start + dur.min(end - start),
        (Some(end), None) => end,
    }
}

/// Factory producing the time context for an element
///
/// Reads the document time details and the parent's start from the scope
/// tree at construction time.
pub fn time_factory(attributes: &Attributes) -> ContextFactory<'_> {
    Box::new(move |tree, parent| {
        let details = tree.time_details();
        let reference_begin = parent
            .and_then(|scope| tree.time_context_id(scope))
            .map_or(0.0, |id| tree.start_time(id));
        Ok(TimeContext::from_attributes(attributes, &details, reference_begin)?.map(Context::Time))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimeBase;

    fn attributes(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn no_timing_attributes_means_no_context() {
        let context =
            TimeContext::from_attributes(&attributes(&[("region", "r1")]), &TimeDetails::default(), 0.0).unwrap();
        assert!(context.is_none());
    }

    #[test]
    fn begin_and_end_are_relative_to_reference() {
        let context = TimeContext::from_attributes(
            &attributes(&[("begin", "1s"), ("end", "3s"), ("dur", "10s")]),
            &TimeDetails::default(),
            5000.0,
        )
        .unwrap()
        .unwrap();
        assert_eq!(context.begin, Some(6000.0));
        assert_eq!(context.end, Some(8000.0));
        assert_eq!(context.dur, Some(10_000.0));
    }

    #[test]
    fn dur_disallowed_for_discontinuous_smpte() {
        let details = TimeDetails::default()
            .with_time_base(TimeBase::Smpte)
            .with_marker_mode(MarkerMode::Discontinuous);
        let err = TimeContext::from_attributes(&attributes(&[("dur", "00:00:01:00")]), &details, 0.0).unwrap_err();
        assert!(matches!(err, CoreError::DisallowedAttribute { .. }));
        assert!(err.is_critical());
    }

    #[test]
    fn invalid_container_keyword() {
        let err = TimeContext::from_attributes(
            &attributes(&[("timeContainer", "excl")]),
            &TimeDetails::default(),
            0.0,
        )
        .unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn active_end_rules() {
        assert_eq!(active_end(1000.0, None, Some(500.0), TimeContainer::Par), 1500.0);
        assert_eq!(active_end(1000.0, None, None, TimeContainer::Par), f64::INFINITY);
        assert_eq!(active_end(1000.0, None, None, TimeContainer::Seq), 0.0);
        assert_eq!(active_end(1000.0, Some(1200.0), Some(500.0), TimeContainer::Par), 1200.0);
        assert_eq!(active_end(1000.0, Some(3000.0), Some(500.0), TimeContainer::Par), 1500.0);
        assert_eq!(active_end(1000.0, Some(3000.0), None, TimeContainer::Seq), 3000.0);
    }

    #[test]
    fn merge_overwrites_set_fields_only() {
        let mut base = TimeContext {
            begin: Some(1.0),
            end: Some(2.0),
            ..TimeContext::default()
        };
        base.merge_with(TimeContext {
            end: Some(5.0),
            time_container: Some(TimeContainer::Seq),
            ..TimeContext::default()
        });
        assert_eq!(base.begin, Some(1.0));
        assert_eq!(base.end, Some(5.0));
        assert_eq!(base.time_container, Some(TimeContainer::Seq));
    }
}
