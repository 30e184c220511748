//! Summary aggregation: a pure fold of per-span results into one [`Summary`].

use spanwatch_types::{AlertRecord, Diagnostics, SchemaVersion, SpanOverview, Summary, TimeRange};

use crate::error::{AnalysisError, Result};
use crate::pipeline::SpanAnalysis;

/// Assemble the run summary.
///
/// Per-span results are ordered by span id; alerts keep the order they were
/// evaluated in. Fails with [`AnalysisError::NoSpans`] if no span has an
/// observed time range.
pub fn aggregate(
    mut analyses: Vec<SpanAnalysis>,
    alerts: Vec<AlertRecord>,
    metrics: Vec<String>,
    mut diagnostics: Diagnostics,
) -> Result<Summary> {
    analyses.sort_by(|a, b| a.span_id.cmp(&b.span_id));

    let run_time_range = analyses
        .iter()
        .filter_map(|a| a.continuity.time_range)
        .reduce(|acc, r| acc.union(&r))
        .ok_or(AnalysisError::NoSpans {
            dropped: diagnostics.dropped_spans.len(),
        })?;

    diagnostics.indeterminate_spans = analyses
        .iter()
        .filter(|a| a.continuity.profile.is_indeterminate())
        .map(|a| a.span_id.clone())
        .collect();

    let mut spans = Vec::with_capacity(analyses.len());
    let mut kpi_results = Vec::new();
    let mut gaps = Vec::new();
    let mut total_records = 0;

    for analysis in analyses {
        total_records += analysis.record_count;
        let continuity = analysis.continuity;
        let time_range = continuity
            .time_range
            .unwrap_or_else(|| TimeRange::instant(run_time_range.start));
        spans.push(SpanOverview {
            span_id: analysis.span_id,
            record_count: analysis.record_count,
            placeholder_count: analysis.placeholder_count,
            time_range,
            expected_count: continuity.expected_count,
            missing_count: continuity.missing_count(),
            profile: continuity.profile,
        });
        gaps.extend(continuity.gaps);
        kpi_results.extend(analysis.kpis);
    }

    Ok(Summary {
        version: SchemaVersion::current(),
        run_time_range,
        span_count: spans.len() as u64,
        total_records,
        metrics,
        spans,
        kpi_results,
        gaps,
        alerts,
        diagnostics,
    })
}
