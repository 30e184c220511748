//! Per-span KPI results.

use core::fmt;
use core::str::FromStr;

use crate::TimeRange;

/// Aggregate statistics over the non-null samples of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aggregates {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
    /// Sample standard deviation; undefined for a single sample.
    pub std_dev: Option<f64>,
}

impl Aggregates {
    /// Read one field by name.
    pub fn get(&self, field: AggregateField) -> Option<f64> {
        match field {
            AggregateField::Mean => Some(self.mean),
            AggregateField::Min => Some(self.min),
            AggregateField::Max => Some(self.max),
            AggregateField::P50 => Some(self.p50),
            AggregateField::P95 => Some(self.p95),
            AggregateField::P99 => Some(self.p99),
            AggregateField::StdDev => self.std_dev,
        }
    }
}

/// Selector for one field of [`Aggregates`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AggregateField {
    #[default]
    Mean,
    Min,
    Max,
    P50,
    P95,
    P99,
    StdDev,
}

impl AggregateField {
    /// Every field, in export order.
    pub const ALL: [AggregateField; 7] = [
        AggregateField::Mean,
        AggregateField::Min,
        AggregateField::Max,
        AggregateField::P50,
        AggregateField::P95,
        AggregateField::P99,
        AggregateField::StdDev,
    ];

    /// Snake-case name used in exports and config.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateField::Mean => "mean",
            AggregateField::Min => "min",
            AggregateField::Max => "max",
            AggregateField::P50 => "p50",
            AggregateField::P95 => "p95",
            AggregateField::P99 => "p99",
            AggregateField::StdDev => "std_dev",
        }
    }
}

impl fmt::Display for AggregateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregateField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregateField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown aggregate field: {s}"))
    }
}

/// KPI summary for one (span, metric) pair.
///
/// `aggregates` and `time_range` are `None` when the metric had no non-null
/// samples in the span. That is "no data", which is distinct from zero.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KpiResult {
    pub span_id: String,
    pub metric_name: String,
    pub aggregates: Option<Aggregates>,
    /// Number of non-null samples used.
    pub sample_count: u64,
    /// First and last timestamp holding a non-null value.
    pub time_range: Option<TimeRange>,
}

impl KpiResult {
    /// Whether the aggregates are undefined.
    pub fn is_undefined(&self) -> bool {
        self.aggregates.is_none()
    }

    /// Read one aggregate field, if defined.
    pub fn get(&self, field: AggregateField) -> Option<f64> {
        self.aggregates.as_ref().and_then(|a| a.get(field))
    }
}
