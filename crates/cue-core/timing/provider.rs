//! Time-base providers
//!
//! Each `ttp:timeBase` value has a [`TimeBaseProvider`] that converts the
//! three expression forms into milliseconds, or refuses forms the time base
//! does not define. [`provider_for`] picks the provider from
//! [`TimeDetails::time_base`].
//!
//! Frame and sub-frame fields are clamped to `[0, rate]` before use; every
//! other out-of-domain input is an error.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::{
    details::{DropMode, TimeBase, TimeDetails},
    expression::{ClockTime, Metric, OffsetTime},
};
use crate::{
    utils::errors::{invalid_time, unsupported_time_expression},
    Result,
};

/// Conversion of time expressions under one time base
pub trait TimeBaseProvider {
    /// Time base served by this provider
    fn time_base(&self) -> TimeBase;

    /// Convert a clock-time expression
    ///
    /// # Errors
    ///
    /// Returns an error when the time base does not accept the form used.
    fn clock_time_ms(&self, time: &ClockTime, details: &TimeDetails, reference_begin: f64) -> Result<f64>;

    /// Convert an offset-time expression
    ///
    /// # Errors
    ///
    /// Returns an error when the time base does not accept the metric used.
    fn offset_time_ms(&self, time: &OffsetTime, details: &TimeDetails, reference_begin: f64) -> Result<f64>;

    /// Convert the inner value of a `wallclock("...")` expression
    ///
    /// # Errors
    ///
    /// Returns an error when the time base has no wall clock or the value is
    /// not a recognized date/time.
    fn wall_clock_ms(&self, value: &str, details: &TimeDetails) -> Result<f64>;
}

/// Provider for `ttp:timeBase="media"`
#[derive(Debug, Clone, Copy, Default)]
pub struct MediaTimeBase;

/// Provider for `ttp:timeBase="clock"`
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockTimeBase;

/// Provider for `ttp:timeBase="smpte"`
#[derive(Debug, Clone, Copy, Default)]
pub struct SmpteTimeBase;

/// Provider serving `time_base`
#[must_use]
pub fn provider_for(time_base: TimeBase) -> &'static dyn TimeBaseProvider {
    match time_base {
        TimeBase::Media => &MediaTimeBase,
        TimeBase::Clock => &ClockTimeBase,
        TimeBase::Smpte => &SmpteTimeBase,
    }
}

fn clamp_to_rate(value: Option<f64>, rate: f64) -> f64 {
    value.unwrap_or(0.0).clamp(0.0, rate)
}

/// Frames plus fractional sub-frames, clamped to the document rates
fn frame_count(time: &ClockTime, details: &TimeDetails) -> f64 {
    let frames = clamp_to_rate(time.frames, details.frame_rate);
    let sub_frames = clamp_to_rate(time.sub_frames, details.sub_frame_rate);
    frames + sub_frames / details.sub_frame_rate
}

impl TimeBaseProvider for MediaTimeBase {
    fn time_base(&self) -> TimeBase {
        TimeBase::Media
    }

    fn clock_time_ms(&self, time: &ClockTime, details: &TimeDetails, reference_begin: f64) -> Result<f64> {
        let seconds = time.whole_seconds() + frame_count(time, details) / details.effective_frame_rate();
        Ok(reference_begin + seconds * 1000.0)
    }

    fn offset_time_ms(&self, time: &OffsetTime, details: &TimeDetails, reference_begin: f64) -> Result<f64> {
        let millis = match time.metric {
            Metric::Ticks => time.value / details.tick_rate * 1000.0,
            Metric::Frames => time.value / details.effective_frame_rate() * 1000.0,
            metric => time.value * metric.fixed_millis().unwrap_or(1000.0),
        };
        Ok(reference_begin + millis)
    }

    fn wall_clock_ms(&self, value: &str, _details: &TimeDetails) -> Result<f64> {
        Err(unsupported_time_expression(
            format!("wallclock(\"{value}\")"),
            TimeBase::Media.as_str(),
        ))
    }
}

impl TimeBaseProvider for ClockTimeBase {
    fn time_base(&self) -> TimeBase {
        TimeBase::Clock
    }

    /// Clock times name a time of day and ignore the reference begin
    fn clock_time_ms(&self, time: &ClockTime, _details: &TimeDetails, _reference_begin: f64) -> Result<f64> {
        if time.has_frames() {
            return Err(unsupported_time_expression(time, TimeBase::Clock.as_str()));
        }
        Ok(time.whole_seconds() * 1000.0)
    }

    fn offset_time_ms(&self, time: &OffsetTime, details: &TimeDetails, reference_begin: f64) -> Result<f64> {
        let millis = match time.metric {
            Metric::Frames => return Err(unsupported_time_expression(time, TimeBase::Clock.as_str())),
            Metric::Ticks => time.value / details.tick_rate * 1000.0,
            metric => time.value * metric.fixed_millis().unwrap_or(1000.0),
        };
        Ok(reference_begin + millis)
    }

    fn wall_clock_ms(&self, value: &str, _details: &TimeDetails) -> Result<f64> {
        parse_wall_clock(value)
    }
}

impl TimeBaseProvider for SmpteTimeBase {
    fn time_base(&self) -> TimeBase {
        TimeBase::Smpte
    }

    /// Time codes are labels, so the reference begin does not apply
    fn clock_time_ms(&self, time: &ClockTime, details: &TimeDetails, _reference_begin: f64) -> Result<f64> {
        let count = time.whole_seconds() * details.frame_rate + frame_count(time, details)
            - dropped_frames(details.drop_mode, time.hours, time.minutes);
        Ok(count / details.effective_frame_rate() * 1000.0)
    }

    fn offset_time_ms(&self, time: &OffsetTime, _details: &TimeDetails, _reference_begin: f64) -> Result<f64> {
        Err(unsupported_time_expression(time, TimeBase::Smpte.as_str()))
    }

    fn wall_clock_ms(&self, value: &str, _details: &TimeDetails) -> Result<f64> {
        Err(unsupported_time_expression(
            format!("wallclock(\"{value}\")"),
            TimeBase::Smpte.as_str(),
        ))
    }
}

/// Frames skipped by drop-frame counting up to `hours:minutes`
#[must_use]
pub fn dropped_frames(drop_mode: DropMode, hours: u32, minutes: u32) -> f64 {
    let (hours, minutes) = (u64::from(hours), u64::from(minutes));
    let dropped = match drop_mode {
        DropMode::NonDrop => 0,
        DropMode::DropNtsc => (hours * 54 + minutes - minutes / 10) * 2,
        DropMode::DropPal => (hours * 27 + minutes / 2 - minutes / 20) * 4,
    };
    dropped as f64
}

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Convert a wall-clock value to milliseconds
///
/// Values with a date count from the Unix epoch; a bare time of day counts
/// from midnight.
fn parse_wall_clock(value: &str) -> Result<f64> {
    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(date_time.and_utc().timestamp_millis() as f64);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| invalid_time(value, "date has no midnight"))?;
        return Ok(midnight.and_utc().timestamp_millis() as f64);
    }

    for format in TIME_FORMATS {
        if let Ok(time) = NaiveTime::parse_from_str(value, format) {
            let millis = u64::from(time.num_seconds_from_midnight()) * 1000
                + u64::from(time.nanosecond() / 1_000_000);
            return Ok(millis as f64);
        }
    }

    Err(invalid_time(value, "unrecognized wallclock value"))
}
