//! Sampling cadence and missing-data types.

use chrono::{DateTime, Utc};

use crate::Interval;

/// Inferred sampling cadence of one span.
///
/// A profile without a nominal interval is *indeterminate*: the span had too
/// few observed records to tell a cadence apart from missing data.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamplingProfile {
    pub span_id: String,
    /// Expected spacing between consecutive samples.
    pub nominal_interval: Option<Interval>,
    /// Largest spacing still considered on-time.
    pub tolerance: Option<Interval>,
}

impl SamplingProfile {
    /// A profile with a known cadence.
    pub fn determinate(span_id: impl Into<String>, nominal: Interval, tolerance: Interval) -> Self {
        Self {
            span_id: span_id.into(),
            nominal_interval: Some(nominal),
            tolerance: Some(tolerance),
        }
    }

    /// A profile for a span whose cadence cannot be inferred.
    pub fn indeterminate(span_id: impl Into<String>) -> Self {
        Self {
            span_id: span_id.into(),
            nominal_interval: None,
            tolerance: None,
        }
    }

    /// Whether no cadence could be inferred.
    pub fn is_indeterminate(&self) -> bool {
        self.nominal_interval.is_none()
    }
}

/// A run of expected-but-absent samples between two observed records.
///
/// `missing_count` is always at least 1.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gap {
    pub span_id: String,
    /// Timestamp of the observed record before the gap.
    pub start: DateTime<Utc>,
    /// Timestamp of the observed record after the gap.
    pub end: DateTime<Utc>,
    /// Number of samples that should have been between `start` and `end`.
    pub missing_count: u64,
}

