//! KPI engine: per-span aggregates over non-null samples.

use spanwatch_types::{Aggregates, KpiResult, Span, TimeRange};

use crate::stats;

/// One result per metric name in the span, in name order.
///
/// Metrics with no non-null samples still get a result, with undefined
/// aggregates.
pub fn compute_span_kpis(span: &Span) -> Vec<KpiResult> {
    span.metric_names()
        .iter()
        .map(|metric| compute_kpi(span, metric))
        .collect()
}

/// Aggregates for one metric of one span.
pub fn compute_kpi(span: &Span, metric: &str) -> KpiResult {
    let samples: Vec<_> = span
        .records
        .iter()
        .filter_map(|r| r.value(metric).map(|v| (r.timestamp, v)))
        .collect();

    let values: Vec<f64> = samples.iter().map(|(_, v)| *v).collect();
    let time_range = match (samples.first(), samples.last()) {
        (Some((first, _)), Some((last, _))) => Some(TimeRange::new(*first, *last)),
        _ => None,
    };

    KpiResult {
        span_id: span.span_id.clone(),
        metric_name: metric.to_string(),
        aggregates: aggregate(&values),
        sample_count: values.len() as u64,
        time_range,
    }
}

/// Aggregates over finite values in timestamp order; `None` if empty.
pub fn aggregate(values: &[f64]) -> Option<Aggregates> {
    let mean = stats::mean(values)?;
    let sorted = stats::sorted(values);
    Some(Aggregates {
        mean,
        min: *sorted.first()?,
        max: *sorted.last()?,
        p50: stats::quantile_sorted(&sorted, 0.50)?,
        p95: stats::quantile_sorted(&sorted, 0.95)?,
        p99: stats::quantile_sorted(&sorted, 0.99)?,
        std_dev: stats::std_dev(values),
    })
}
