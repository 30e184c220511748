//! Summary - the single run-level artifact handed to exporters.

use crate::{AlertRecord, Gap, KpiResult, SamplingProfile, SchemaVersion, Severity, TimeRange};

/// Row, field and span-local problems absorbed during a run.
///
/// None of these abort the run; they are surfaced here instead.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    /// Rows in the input batch.
    pub rows_total: u64,
    /// Rows dropped for lacking a span identifier.
    pub rows_missing_span: u64,
    /// Rows dropped because the timestamp was absent or unparsable.
    pub timestamp_parse_errors: u64,
    /// Metric cells that could not be cast to a number (kept as null).
    pub metric_parse_errors: u64,
    /// Rows discarded by last-write-wins deduplication.
    pub duplicates_removed: u64,
    /// Null records inserted by resampling.
    pub placeholders_inserted: u64,
    /// Spans with no valid records after parsing, in span-id order.
    pub dropped_spans: Vec<String>,
    /// Spans whose sampling interval could not be inferred, in span-id order.
    pub indeterminate_spans: Vec<String>,
}

impl Diagnostics {
    /// Whether any row or field had to be repaired or dropped.
    pub fn is_clean(&self) -> bool {
        self.rows_missing_span == 0
            && self.timestamp_parse_errors == 0
            && self.metric_parse_errors == 0
            && self.duplicates_removed == 0
            && self.dropped_spans.is_empty()
    }
}

/// Per-span continuity overview.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpanOverview {
    pub span_id: String,
    /// Observed records after normalization.
    pub record_count: u64,
    /// Resampling placeholders in the span.
    pub placeholder_count: u64,
    pub time_range: TimeRange,
    pub profile: SamplingProfile,
    /// Samples the cadence implies between the first and last record.
    pub expected_count: u64,
    /// Sum of `missing_count` over the span's gaps.
    pub missing_count: u64,
}

/// Result of one analysis run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,
    /// Union of all surviving spans' observed time ranges.
    pub run_time_range: TimeRange,
    /// Spans that survived normalization.
    pub span_count: u64,
    /// Observed records across surviving spans.
    pub total_records: u64,
    /// Metric names present in the batch, sorted.
    pub metrics: Vec<String>,
    pub spans: Vec<SpanOverview>,
    pub kpi_results: Vec<KpiResult>,
    pub gaps: Vec<Gap>,
    pub alerts: Vec<AlertRecord>,
    pub diagnostics: Diagnostics,
}

impl Summary {
    /// Number of alerts at a given severity.
    pub fn alert_count(&self, severity: Severity) -> usize {
        self.alerts.iter().filter(|a| a.severity == severity).count()
    }

    /// KPI result for one (span, metric) pair.
    pub fn kpi(&self, span_id: &str, metric: &str) -> Option<&KpiResult> {
        self.kpi_results
            .iter()
            .find(|k| k.span_id == span_id && k.metric_name == metric)
    }

    /// Gaps detected in one span.
    pub fn gaps_for<'a>(&'a self, span_id: &'a str) -> impl Iterator<Item = &'a Gap> + 'a {
        self.gaps.iter().filter(move |g| g.span_id == span_id)
    }

    /// Alerts raised for one span.
    pub fn alerts_for<'a>(&'a self, span_id: &'a str) -> impl Iterator<Item = &'a AlertRecord> + 'a {
        self.alerts.iter().filter(move |a| a.span_id == span_id)
    }

    /// Overview of one span.
    pub fn span(&self, span_id: &str) -> Option<&SpanOverview> {
        self.spans.iter().find(|s| s.span_id == span_id)
    }

    /// Total missing samples across all spans.
    pub fn total_missing(&self) -> u64 {
        self.gaps.iter().map(|g| g.missing_count).sum()
    }
}
