//! Lexical forms of TTML time expressions
//!
//! Three forms exist:
//!
//! - clock-time: `hh:mm:ss`, `hh:mm:ss.fraction`, `hh:mm:ss:frames` and
//!   `hh:mm:ss:frames.subframes`, with `;` accepted before the frames field
//!   (drop-frame notation)
//! - offset-time: a number followed by one of `h m s ms f t`
//! - wall-clock: `wallclock("...")`
//!
//! This module only recognizes the form. Conversion to milliseconds depends
//! on the time base and lives in [`super::provider`].

use core::fmt;

use crate::{utils::errors::invalid_time, Result};

/// Parsed time expression
#[derive(Debug, Clone, PartialEq)]
pub enum TimeExpression {
    /// `hh:mm:ss...`
    Clock(ClockTime),
    /// `12.5s`, `300t`, ...
    Offset(OffsetTime),
    /// Inner value of `wallclock("...")`
    WallClock(String),
}

/// Clock-time components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTime {
    /// Hours, any number of digits
    pub hours: u32,
    /// Minutes, `0..60`
    pub minutes: u32,
    /// Seconds including any decimal fraction
    pub seconds: f64,
    /// Frame field
    pub frames: Option<f64>,
    /// Sub-frame field
    pub sub_frames: Option<f64>,
    /// Frames were introduced with `;`
    pub drop_notation: bool,
}

impl ClockTime {
    /// Check if the expression names frames or sub-frames
    #[must_use]
    pub const fn has_frames(&self) -> bool {
        self.frames.is_some() || self.sub_frames.is_some()
    }

    /// Seconds since zero for the hour, minute and second fields
    #[must_use]
    pub fn whole_seconds(&self) -> f64 {
        f64::from(self.hours) * 3600.0 + f64::from(self.minutes) * 60.0 + self.seconds
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)?;
        if let Some(frames) = self.frames {
            let separator = if self.drop_notation { ';' } else { ':' };
            write!(f, "{separator}{frames:02}")?;
            if let Some(sub_frames) = self.sub_frames {
                write!(f, ".{sub_frames}")?;
            }
        }
        Ok(())
    }
}

/// Offset-time metric
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// `h`
    Hours,
    /// `m`
    Minutes,
    /// `s`
    Seconds,
    /// `ms`
    Milliseconds,
    /// `f`
    Frames,
    /// `t`
    Ticks,
}

impl Metric {
    fn parse(suffix: &str) -> Option<Self> {
        Some(match suffix {
            "h" => Self::Hours,
            "m" => Self::Minutes,
            "s" => Self::Seconds,
            "ms" => Self::Milliseconds,
            "f" => Self::Frames,
            "t" => Self::Ticks,
            _ => return None,
        })
    }

    /// Markup suffix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hours => "h",
            Self::Minutes => "m",
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Frames => "f",
            Self::Ticks => "t",
        }
    }

    /// Milliseconds per unit for the wall-time metrics
    ///
    /// `None` for frames and ticks, whose length depends on document rates.
    #[must_use]
    pub const fn fixed_millis(self) -> Option<f64> {
        match self {
            Self::Hours => Some(3_600_000.0),
            Self::Minutes => Some(60_000.0),
            Self::Seconds => Some(1000.0),
            Self::Milliseconds => Some(1.0),
            Self::Frames | Self::Ticks => None,
        }
    }
}

/// Offset-time value and metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetTime {
    /// Numeric part
    pub value: f64,
    /// Unit
    pub metric: Metric,
}

impl fmt::Display for OffsetTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.metric.as_str())
    }
}

/// Recognize a time expression
///
/// # Errors
///
/// Returns [`crate::CoreError::InvalidTime`] when the text matches none of
/// the three forms or a field is out of range.
pub fn parse_time_expression(input: &str) -> Result<TimeExpression> {
    let expression = input.trim();
    if expression.is_empty() {
        return Err(invalid_time(input, "empty expression"));
    }

    if let Some(rest) = expression.strip_prefix("wallclock(") {
        let inner = rest
            .strip_suffix(')')
            .map(str::trim)
            .and_then(|quoted| quoted.strip_prefix('"'))
            .and_then(|quoted| quoted.strip_suffix('"'))
            .ok_or_else(|| invalid_time(input, "wallclock value must be a quoted string"))?;
        return Ok(TimeExpression::WallClock(inner.trim().to_string()));
    }

    if expression.contains([':', ';']) {
        parse_clock_time(expression).map(TimeExpression::Clock)
    } else {
        parse_offset_time(expression).map(TimeExpression::Offset)
    }
}

fn all_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn two_digits(field: &str, expression: &str, name: &str) -> Result<u32> {
    if field.len() != 2 || !all_digits(field) {
        return Err(invalid_time(expression, &format!("{name} must be two digits")));
    }
    Ok(field.parse()?)
}

fn fraction(digits: &str, expression: &str) -> Result<f64> {
    if !all_digits(digits) {
        return Err(invalid_time(expression, "malformed fraction"));
    }
    format!("0.{digits}")
        .parse()
        .map_err(|_| invalid_time(expression, "malformed fraction"))
}

fn parse_clock_time(expression: &str) -> Result<ClockTime> {
    let fields: Vec<&str> = expression.split([':', ';']).collect();
    let separators: Vec<char> = expression.chars().filter(|c| matches!(c, ':' | ';')).collect();

    if !(3..=4).contains(&fields.len()) {
        return Err(invalid_time(expression, "expected hh:mm:ss or hh:mm:ss:ff"));
    }
    if separators[..2].contains(&';') {
        return Err(invalid_time(expression, "';' may only introduce the frames field"));
    }

    if !all_digits(fields[0]) {
        return Err(invalid_time(expression, "hours must be numeric"));
    }
    let hours: u32 = fields[0]
        .parse()
        .map_err(|_| invalid_time(expression, "hours out of range"))?;
    let minutes = two_digits(fields[1], expression, "minutes")?;
    if minutes >= 60 {
        return Err(invalid_time(expression, "minutes out of range"));
    }

    let (whole_seconds, seconds_fraction) = match fields[2].split_once('.') {
        Some((whole, digits)) if fields.len() == 3 => (whole, Some(digits)),
        Some(_) => return Err(invalid_time(expression, "fractional seconds cannot precede frames")),
        None => (fields[2], None),
    };
    let whole = two_digits(whole_seconds, expression, "seconds")?;
    if whole >= 60 {
        return Err(invalid_time(expression, "seconds out of range"));
    }
    let mut seconds = f64::from(whole);
    if let Some(digits) = seconds_fraction {
        seconds += fraction(digits, expression)?;
    }

    let (frames, sub_frames) = match fields.get(3) {
        None => (None, None),
        Some(field) => {
            let (frames, sub_frames) = field.split_once('.').map_or((*field, None), |(f, s)| (f, Some(s)));
            if !all_digits(frames) {
                return Err(invalid_time(expression, "frames must be numeric"));
            }
            let sub_frames = match sub_frames {
                Some(digits) if all_digits(digits) => Some(
                    digits
                        .parse::<u32>()
                        .map(f64::from)
                        .map_err(|_| invalid_time(expression, "sub-frames out of range"))?,
                ),
                Some(_) => return Err(invalid_time(expression, "sub-frames must be numeric")),
                None => None,
            };
            let frames = frames
                .parse::<u32>()
                .map_err(|_| invalid_time(expression, "frames out of range"))?;
            (Some(f64::from(frames)), sub_frames)
        }
    };

    Ok(ClockTime {
        hours,
        minutes,
        seconds,
        frames,
        sub_frames,
        drop_notation: separators.get(2) == Some(&';'),
    })
}

fn parse_offset_time(expression: &str) -> Result<OffsetTime> {
    let split = expression
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .ok_or_else(|| invalid_time(expression, "missing metric"))?;
    let (number, suffix) = expression.split_at(split);

    let well_formed = match number.split_once('.') {
        Some((whole, digits)) => all_digits(whole) && all_digits(digits),
        None => all_digits(number),
    };
    if !well_formed {
        return Err(invalid_time(expression, "malformed number"));
    }

    let metric = Metric::parse(suffix).ok_or_else(|| invalid_time(expression, "unknown metric"))?;
    let value = number
        .parse()
        .map_err(|_| invalid_time(expression, "malformed number"))?;
    Ok(OffsetTime { value, metric })
}
