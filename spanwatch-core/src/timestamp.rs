//! Timestamp parsing against an ordered list of accepted formats.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use spanwatch_types::RawValue;

use crate::error::{AnalysisError, Result};

/// One accepted timestamp format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimestampFormat {
    /// RFC 3339 / ISO 8601 with offset, e.g. `2024-01-01T00:00:00Z`.
    Rfc3339,
    /// Unix seconds, integer or fractional.
    EpochSeconds,
    /// Unix milliseconds.
    EpochMillis,
    /// A chrono strftime pattern. Patterns without an offset are read as UTC.
    Pattern(String),
}

impl TimestampFormat {
    /// Parse a format name from configuration.
    ///
    /// `rfc3339`, `epoch_s` and `epoch_ms` are keywords; anything else must be
    /// a valid strftime pattern.
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.trim() {
            "rfc3339" | "iso8601" => Ok(TimestampFormat::Rfc3339),
            "epoch_s" | "epoch" => Ok(TimestampFormat::EpochSeconds),
            "epoch_ms" => Ok(TimestampFormat::EpochMillis),
            "" => Err(AnalysisError::InvalidTimestampFormat(spec.to_string())),
            pattern => {
                let has_error = StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
                let has_directive = pattern.contains('%');
                if has_error || !has_directive {
                    return Err(AnalysisError::InvalidTimestampFormat(spec.to_string()));
                }
                Ok(TimestampFormat::Pattern(pattern.to_string()))
            }
        }
    }

    fn parse_text(&self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            TimestampFormat::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            TimestampFormat::EpochSeconds => s.parse::<f64>().ok().and_then(from_epoch_secs),
            TimestampFormat::EpochMillis => s.parse::<f64>().ok().and_then(from_epoch_millis),
            TimestampFormat::Pattern(p) => parse_pattern(s, p),
        }
    }

    fn parse_number(&self, n: f64) -> Option<DateTime<Utc>> {
        match self {
            TimestampFormat::EpochSeconds => from_epoch_secs(n),
            TimestampFormat::EpochMillis => from_epoch_millis(n),
            _ => None,
        }
    }
}

fn has_offset_directive(pattern: &str) -> bool {
    pattern.contains("%z") || pattern.contains("%:z") || pattern.contains("%#z")
}

fn parse_pattern(s: &str, pattern: &str) -> Option<DateTime<Utc>> {
    if has_offset_directive(pattern) {
        return DateTime::parse_from_str(s, pattern)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
        return Some(naive.and_utc());
    }
    // Date-only patterns resolve to midnight.
    NaiveDate::parse_from_str(s, pattern)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn from_epoch_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}

fn from_epoch_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((millis * 1_000.0).round() as i64)
}

/// Parses raw cells using the first accepted format that matches.
#[derive(Debug, Clone)]
pub struct TimestampParser {
    formats: Vec<TimestampFormat>,
}

impl TimestampParser {
    /// Build a parser from configured format strings.
    ///
    /// Fails on the first unusable format, or if the list is empty.
    pub fn new<S: AsRef<str>>(specs: &[S]) -> Result<Self> {
        if specs.is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "accepted_timestamp_formats must not be empty".to_string(),
            ));
        }
        let formats = specs
            .iter()
            .map(|s| TimestampFormat::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { formats })
    }

    /// Configured formats, in priority order.
    pub fn formats(&self) -> &[TimestampFormat] {
        &self.formats
    }

    /// Parse a cell. Returns `None` if it is empty or no format matches.
    pub fn parse(&self, value: &RawValue) -> Option<DateTime<Utc>> {
        match value {
            RawValue::Empty => None,
            RawValue::Number(n) => self.formats.iter().find_map(|f| f.parse_number(*n)),
            RawValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return None;
                }
                self.formats.iter().find_map(|f| f.parse_text(s))
            }
        }
    }
}
