//! Interval representation for sampling cadence.
//!
//! We use microseconds as the canonical unit so that serialized intervals are
//! integers and compare exactly across runs and languages.

use core::fmt;
use core::str::FromStr;

use chrono::TimeDelta;

/// Suffix to microseconds multiplier (order matters: longer suffixes first)
const UNITS: &[(&str, f64)] = &[
    ("ms", 1_000.0),
    ("us", 1.0),
    ("µs", 1.0),
    ("s", 1_000_000.0),
    ("m", 60_000_000.0),
    ("h", 3_600_000_000.0),
    ("d", 86_400_000_000.0),
];

/// A non-negative time interval with microsecond resolution.
///
/// Used for nominal sampling intervals, gap tolerances and the optional
/// configured grid interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Interval(pub u64);

impl Interval {
    /// Create from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Create from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis * 1_000)
    }

    /// Create from seconds.
    pub const fn from_secs(secs: u64) -> Self {
        Self(secs * 1_000_000)
    }

    /// Create from minutes.
    pub const fn from_mins(mins: u64) -> Self {
        Self(mins * 60_000_000)
    }

    /// Create from a chrono delta. Negative deltas clamp to zero.
    pub fn from_delta(delta: TimeDelta) -> Self {
        Self(delta.num_microseconds().map_or(0, |us| us.max(0) as u64))
    }

    /// Get the value in microseconds.
    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Whether this interval is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiply by a non-negative factor, rounding to the nearest microsecond.
    pub fn mul_f64(&self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round().max(0.0) as u64)
    }

    /// Convert to a chrono delta for timestamp arithmetic.
    pub fn to_delta(&self) -> TimeDelta {
        TimeDelta::microseconds(self.0 as i64)
    }

    /// Number of whole intervals in `delta`, rounded to nearest.
    ///
    /// Returns `None` for a zero interval.
    pub fn steps_in(&self, delta: TimeDelta) -> Option<i64> {
        if self.0 == 0 {
            return None;
        }
        let micros = delta.num_microseconds()? as f64;
        Some((micros / self.0 as f64).round() as i64)
    }

    /// Parse interval strings like "60s", "15m", "1h", "250ms".
    pub fn parse(s: &str) -> Result<Self, ParseIntervalError> {
        let s = s.trim();

        for (suffix, multiplier) in UNITS {
            if let Some(val_str) = s.strip_suffix(suffix) {
                let val: f64 = val_str
                    .trim()
                    .parse()
                    .map_err(|_| ParseIntervalError(s.to_string()))?;
                if !val.is_finite() || val < 0.0 {
                    return Err(ParseIntervalError(s.to_string()));
                }
                return Ok(Self((val * multiplier).round() as u64));
            }
        }

        Err(ParseIntervalError(s.to_string()))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let us = self.0;
        if us == 0 {
            write!(f, "0s")
        } else if us % 3_600_000_000 == 0 {
            write!(f, "{}h", us / 3_600_000_000)
        } else if us % 60_000_000 == 0 {
            write!(f, "{}m", us / 60_000_000)
        } else if us % 1_000_000 == 0 {
            write!(f, "{}s", us / 1_000_000)
        } else if us % 1_000 == 0 {
            write!(f, "{}ms", us / 1_000)
        } else {
            write!(f, "{}us", us)
        }
    }
}

impl FromStr for Interval {
    type Err = ParseIntervalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Error returned when an interval string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIntervalError(pub String);

impl fmt::Display for ParseIntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown interval format: {:?}", self.0)
    }
}

impl std::error::Error for ParseIntervalError {}
