//! Time expressions, time bases and the cue time index
//!
//! [`parse_time_string`] is the single entry point used by the scope layer:
//! it recognizes the expression form and hands it to the provider for the
//! document's time base.
//!
//! ```rust
//! use cue_core::timing::{format_clock_time, parse_time_string, TimeDetails};
//!
//! let details = TimeDetails::default();
//! let ms = parse_time_string("00:01:02.500", &details, 0.0)?;
//! assert_eq!(ms, 62_500.0);
//! assert_eq!(format_clock_time(ms), "00:01:02.500");
//! # Ok::<(), cue_core::CoreError>(())
//! ```

pub mod details;
pub mod expression;
pub mod interval_tree;
pub mod provider;

pub use details::{ClockMode, DropMode, MarkerMode, TimeBase, TimeDetails};
pub use expression::{parse_time_expression, ClockTime, Metric, OffsetTime, TimeExpression};
pub use interval_tree::{IntervalNode, IntervalTree, Leaf, QueryRange};
pub use provider::{provider_for, ClockTimeBase, MediaTimeBase, SmpteTimeBase, TimeBaseProvider};

use crate::{utils::errors::invalid_time, Result};

/// Convert a time expression to milliseconds
///
/// `reference_begin` is the begin of the enclosing time container; the
/// media and clock time bases add it to relative expressions.
///
/// # Errors
///
/// Returns [`crate::CoreError::InvalidTime`] for malformed expressions and
/// [`crate::CoreError::UnsupportedTimeExpression`] for forms the time base
/// refuses.
pub fn parse_time_string(value: &str, details: &TimeDetails, reference_begin: f64) -> Result<f64> {
    let provider = provider_for(details.time_base);
    let millis = match parse_time_expression(value)? {
        TimeExpression::Clock(time) => provider.clock_time_ms(&time, details, reference_begin)?,
        TimeExpression::Offset(time) => provider.offset_time_ms(&time, details, reference_begin)?,
        TimeExpression::WallClock(wall) => provider.wall_clock_ms(&wall, details)?,
    };

    if millis.is_finite() {
        Ok(millis)
    } else {
        Err(invalid_time(value, "value does not fit the timeline"))
    }
}

/// Format milliseconds as `hh:mm:ss.mmm`
///
/// Rounds to the nearest millisecond. Infinite ends render as `indefinite`.
#[must_use]
pub fn format_clock_time(millis: f64) -> String {
    if !millis.is_finite() {
        return "indefinite".to_string();
    }
    let total = millis.max(0.0).round() as u64;
    let (hours, rest) = (total / 3_600_000, total % 3_600_000);
    let (minutes, rest) = (rest / 60_000, rest % 60_000);
    let (seconds, millis) = (rest / 1000, rest % 1000);
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;

    #[test]
    fn offsets_are_relative_to_reference() {
        let details = TimeDetails::default();
        assert_eq!(parse_time_string("2s", &details, 1000.0).unwrap(), 3000.0);
        assert_eq!(parse_time_string("250ms", &details, 0.0).unwrap(), 250.0);
    }

    #[test]
    fn time_base_refusals_surface() {
        let clock = TimeDetails::default().with_time_base(TimeBase::Clock);
        assert!(matches!(
            parse_time_string("00:00:01:10", &clock, 0.0),
            Err(CoreError::UnsupportedTimeExpression { .. })
        ));
        let smpte = TimeDetails::default().with_time_base(TimeBase::Smpte);
        assert!(matches!(
            parse_time_string("5s", &smpte, 0.0),
            Err(CoreError::UnsupportedTimeExpression { .. })
        ));
    }

    #[test]
    fn format_pads_fields() {
        assert_eq!(format_clock_time(0.0), "00:00:00.000");
        assert_eq!(format_clock_time(3_723_456.0), "01:02:03.456");
        assert_eq!(format_clock_time(359_999_999.6), "100:00:00.000");
        assert_eq!(format_clock_time(f64::INFINITY), "indefinite");
    }

    #[test]
    fn round_trip_media_and_clock() {
        for base in [TimeBase::Media, TimeBase::Clock] {
            let details = TimeDetails::default().with_time_base(base);
            for millis in [0.0, 1.0, 999.0, 61_001.0, 3_599_999.0, 36_000_123.0] {
                let parsed = parse_time_string(&format_clock_time(millis), &details, 0.0).unwrap();
                assert!((parsed - millis).abs() < 1.0, "{base}: {millis} -> {parsed}");
            }
        }
    }
}
