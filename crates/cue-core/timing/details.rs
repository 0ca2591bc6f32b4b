//! Document-level timing parameters
//!
//! [`TimeDetails`] gathers the `ttp:*` parameters that govern how time
//! expressions convert to milliseconds. They are read once from the root
//! element and carried by the document context.

use core::{fmt, str::FromStr};

use crate::{tokenizer::Attributes, utils::CoreError};

/// Semantic model for time expressions (`ttp:timeBase`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TimeBase {
    /// Times relative to the media timeline
    #[default]
    Media,
    /// Real-world clock times
    Clock,
    /// SMPTE time codes
    Smpte,
}

/// Drop-frame compensation (`ttp:dropMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum DropMode {
    /// No frames dropped
    #[default]
    NonDrop,
    /// 29.97 fps NTSC drop-frame counting
    DropNtsc,
    /// PAL-M drop-frame counting
    DropPal,
}

/// SMPTE marker continuity (`ttp:markerMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MarkerMode {
    /// Time codes increase monotonically
    #[default]
    Continuous,
    /// Time codes are labels without ordering
    Discontinuous,
}

/// Reference clock for the `clock` time base (`ttp:clockMode`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ClockMode {
    /// Coordinated universal time
    #[default]
    Utc,
    /// Local time
    Local,
    /// GPS time
    Gps,
}

macro_rules! keyword_enum {
    ($ty:ty, $attribute:literal, { $($keyword:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = CoreError;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value.trim() {
                    $($keyword => Ok(Self::$variant),)+
                    other => Err(CoreError::InvalidAttribute {
                        attribute: $attribute.to_string(),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl $ty {
            /// Keyword used in markup
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $keyword,)+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

keyword_enum!(TimeBase, "ttp:timeBase", {
    "media" => Media,
    "clock" => Clock,
    "smpte" => Smpte,
});

keyword_enum!(DropMode, "ttp:dropMode", {
    "nonDrop" => NonDrop,
    "dropNTSC" => DropNtsc,
    "dropPAL" => DropPal,
});

keyword_enum!(MarkerMode, "ttp:markerMode", {
    "continuous" => Continuous,
    "discontinuous" => Discontinuous,
});

keyword_enum!(ClockMode, "ttp:clockMode", {
    "utc" => Utc,
    "local" => Local,
    "gps" => Gps,
});

/// Timing parameters of a document
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TimeDetails {
    /// Active time base
    pub time_base: TimeBase,
    /// Nominal frames per second
    pub frame_rate: f64,
    /// Sub-frames per frame
    pub sub_frame_rate: f64,
    /// Numerator and denominator applied to `frame_rate`
    pub frame_rate_multiplier: (f64, f64),
    /// Ticks per second for `t` offsets
    pub tick_rate: f64,
    /// Drop-frame mode for SMPTE time codes
    pub drop_mode: DropMode,
    /// SMPTE marker mode
    pub marker_mode: MarkerMode,
    /// Clock mode for the `clock` time base
    pub clock_mode: ClockMode,
}

impl Default for TimeDetails {
    fn default() -> Self {
        Self {
            time_base: TimeBase::Media,
            frame_rate: 30.0,
            sub_frame_rate: 1.0,
            frame_rate_multiplier: (1.0, 1.0),
            tick_rate: 30.0,
            drop_mode: DropMode::NonDrop,
            marker_mode: MarkerMode::Continuous,
            clock_mode: ClockMode::Utc,
        }
    }
}

impl TimeDetails {
    /// Frame rate after the multiplier is applied
    #[must_use]
    pub fn effective_frame_rate(&self) -> f64 {
        let (numerator, denominator) = self.frame_rate_multiplier;
        self.frame_rate * numerator / denominator
    }

    /// Builder-style time base override
    #[must_use]
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = time_base;
        self
    }

    /// Builder-style frame rate override
    #[must_use]
    pub fn with_frame_rate(mut self, frame_rate: f64) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    /// Builder-style frame rate multiplier override
    #[must_use]
    pub fn with_frame_rate_multiplier(mut self, numerator: f64, denominator: f64) -> Self {
        self.frame_rate_multiplier = (numerator, denominator);
        self
    }

    /// Builder-style drop mode override
    #[must_use]
    pub fn with_drop_mode(mut self, drop_mode: DropMode) -> Self {
        self.drop_mode = drop_mode;
        self
    }

    /// Builder-style marker mode override
    #[must_use]
    pub fn with_marker_mode(mut self, marker_mode: MarkerMode) -> Self {
        self.marker_mode = marker_mode;
        self
    }

    /// Builder-style tick rate override
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Read `ttp:*` parameters from root attributes on top of `base`
    ///
    /// Malformed values keep the value from `base` and are reported through
    /// `issues`. Without an explicit `ttp:tickRate` the tick rate is
    /// `frameRate * subFrameRate`, so 30 for a bare document.
    pub fn from_attributes(attributes: &Attributes, base: &Self, issues: &mut Vec<CoreError>) -> Self {
        let mut details = *base;

        read_keyword(attributes, "ttp:timeBase", &mut details.time_base, issues);
        read_keyword(attributes, "ttp:dropMode", &mut details.drop_mode, issues);
        read_keyword(attributes, "ttp:markerMode", &mut details.marker_mode, issues);
        read_keyword(attributes, "ttp:clockMode", &mut details.clock_mode, issues);

        read_positive(attributes, "ttp:frameRate", &mut details.frame_rate, issues);
        read_positive(attributes, "ttp:subFrameRate", &mut details.sub_frame_rate, issues);

        if let Some(value) = attributes.get("ttp:frameRateMultiplier") {
            match parse_multiplier(value) {
                Some(multiplier) => details.frame_rate_multiplier = multiplier,
                None => issues.push(invalid_attribute("ttp:frameRateMultiplier", value)),
            }
        }

        let tick_rate_set = read_positive(attributes, "ttp:tickRate", &mut details.tick_rate, issues);
        if !tick_rate_set {
            details.tick_rate = details.frame_rate * details.sub_frame_rate;
        }

        details
    }
}

fn invalid_attribute(attribute: &str, value: &str) -> CoreError {
    CoreError::InvalidAttribute {
        attribute: attribute.to_string(),
        value: value.to_string(),
    }
}

fn read_keyword<T: FromStr<Err = CoreError>>(
    attributes: &Attributes,
    name: &str,
    target: &mut T,
    issues: &mut Vec<CoreError>,
) {
    if let Some(value) = attributes.get(name) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(err) => issues.push(err),
        }
    }
}

fn read_positive(attributes: &Attributes, name: &str, target: &mut f64, issues: &mut Vec<CoreError>) -> bool {
    let Some(value) = attributes.get(name) else {
        return false;
    };
    match value.trim().parse::<u32>() {
        Ok(parsed) if parsed > 0 => {
            *target = f64::from(parsed);
            true
        }
        _ => {
            issues.push(invalid_attribute(name, value));
            false
        }
    }
}

/// Parse the `"numerator denominator"` form of `ttp:frameRateMultiplier`
fn parse_multiplier(value: &str) -> Option<(f64, f64)> {
    let mut parts = value.split_ascii_whitespace();
    let numerator: u32 = parts.next()?.parse().ok()?;
    let denominator: u32 = parts.next().map_or(Some(1), |d| d.parse().ok())?;
    if parts.next().is_some() || numerator == 0 || denominator == 0 {
        return None;
    }
    Some((f64::from(numerator), f64::from(denominator)))
}
