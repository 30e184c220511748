//! Normalized telemetry records and the spans that own them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// Where a normalized record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RecordOrigin {
    /// Parsed from an input row.
    #[default]
    Observed,
    /// Inserted by resampling at an empty grid point; every metric is null.
    Placeholder,
}

/// One timestamped sample of a span's metrics.
///
/// A `None` metric value means "no data" and is never treated as zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryRecord {
    /// Span this record belongs to.
    pub span_id: String,
    /// Sample time in UTC.
    pub timestamp: DateTime<Utc>,
    /// Metric name to value; `None` is a null measurement.
    pub metrics: BTreeMap<String, Option<f64>>,
    /// Observed row or resampling placeholder.
    #[cfg_attr(feature = "serde", serde(default))]
    pub origin: RecordOrigin,
}

impl TelemetryRecord {
    /// Create an observed record with no metrics.
    pub fn new(span_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            span_id: span_id.into(),
            timestamp,
            metrics: BTreeMap::new(),
            origin: RecordOrigin::Observed,
        }
    }

    /// Create a placeholder record carrying a null for each named metric.
    pub fn placeholder<'a>(
        span_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        metric_names: impl IntoIterator<Item = &'a String>,
    ) -> Self {
        Self {
            span_id: span_id.into(),
            timestamp,
            metrics: metric_names.into_iter().map(|m| (m.clone(), None)).collect(),
            origin: RecordOrigin::Placeholder,
        }
    }

    /// Set a metric value (builder style).
    pub fn with_metric(mut self, name: impl Into<String>, value: Option<f64>) -> Self {
        self.metrics.insert(name.into(), value);
        self
    }

    /// Non-null value of a metric, if present.
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.metrics.get(metric).copied().flatten()
    }

    /// Whether this record came from input data.
    pub fn is_observed(&self) -> bool {
        self.origin == RecordOrigin::Observed
    }
}

/// An inclusive time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range; the endpoints are swapped if given in reverse.
    pub fn new(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// A range covering a single instant.
    pub fn instant(t: DateTime<Utc>) -> Self {
        Self { start: t, end: t }
    }

    /// Smallest range covering both.
    pub fn union(&self, other: &TimeRange) -> TimeRange {
        TimeRange {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Extend to cover an instant.
    pub fn include(&self, t: DateTime<Utc>) -> TimeRange {
        TimeRange {
            start: self.start.min(t),
            end: self.end.max(t),
        }
    }

    /// Range covering every timestamp yielded, or `None` if empty.
    pub fn covering(timestamps: impl IntoIterator<Item = DateTime<Utc>>) -> Option<TimeRange> {
        timestamps.into_iter().fold(None, |acc, t| match acc {
            None => Some(TimeRange::instant(t)),
            Some(r) => Some(r.include(t)),
        })
    }

    /// Length of the range.
    pub fn duration(&self) -> chrono::TimeDelta {
        self.end - self.start
    }
}

/// A monitored optical path segment and its ordered records.
///
/// Records are sorted by timestamp with no duplicate timestamps. A span is
/// immutable once the normalizer hands it on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    pub span_id: String,
    pub records: Vec<TelemetryRecord>,
}

impl Span {
    /// Create a span from records already in timestamp order.
    pub fn new(span_id: impl Into<String>, records: Vec<TelemetryRecord>) -> Self {
        Self {
            span_id: span_id.into(),
            records,
        }
    }

    /// Records that came from input rows.
    pub fn observed(&self) -> impl Iterator<Item = &TelemetryRecord> {
        self.records.iter().filter(|r| r.is_observed())
    }

    /// Number of observed records.
    pub fn observed_count(&self) -> usize {
        self.observed().count()
    }

    /// Number of resampling placeholders.
    pub fn placeholder_count(&self) -> usize {
        self.records.len() - self.observed_count()
    }

    /// Range of observed timestamps, or `None` if there are none.
    pub fn time_range(&self) -> Option<TimeRange> {
        TimeRange::covering(self.observed().map(|r| r.timestamp))
    }

    /// Sorted, de-duplicated metric names appearing in any record.
    pub fn metric_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .records
            .iter()
            .flat_map(|r| r.metrics.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}
