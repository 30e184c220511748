//! Continuity analysis: sampling cadence, gaps and time-range boundaries.
//!
//! Only observed records are considered. Resampling placeholders sit exactly
//! on the grid points a gap already accounts for, so counting them would
//! report the same absence twice.

use spanwatch_types::{Gap, Interval, SamplingProfile, Span, TimeRange};
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::stats;

/// Median spacing between consecutive observed records, rounded to the
/// microsecond. `None` with fewer than two observed records.
pub fn nominal_interval(span: &Span) -> Option<Interval> {
    let deltas = observed_deltas(span);
    let median = stats::median_i64(&deltas)?;
    let interval = Interval::from_micros(median.max(0) as u64);
    (!interval.is_zero()).then_some(interval)
}

fn observed_deltas(span: &Span) -> Vec<i64> {
    let times: Vec<_> = span.observed().map(|r| r.timestamp).collect();
    times
        .windows(2)
        .filter_map(|w| (w[1] - w[0]).num_microseconds())
        .collect()
}

/// Continuity findings for one span.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuityReport {
    pub profile: SamplingProfile,
    /// Gaps strictly between observed records, in time order.
    pub gaps: Vec<Gap>,
    /// First and last observed timestamp.
    pub time_range: Option<TimeRange>,
    /// Samples the cadence implies between the first and last record.
    pub expected_count: u64,
    pub observed_count: u64,
}

impl ContinuityReport {
    /// Sum of missing samples over every gap.
    pub fn missing_count(&self) -> u64 {
        self.gaps.iter().map(|g| g.missing_count).sum()
    }
}

/// Infers cadence and detects gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct ContinuityAnalyzer {
    tolerance_multiplier: f64,
    expected_interval: Option<Interval>,
}

impl ContinuityAnalyzer {
    pub fn new(tolerance_multiplier: f64, expected_interval: Option<Interval>) -> Self {
        Self {
            tolerance_multiplier,
            expected_interval,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(config.gap_tolerance_multiplier, config.expected_interval)
    }

    /// Cadence of a span: the configured interval if set, else the inferred
    /// median. A span with fewer than two observed records has none either way.
    pub fn profile(&self, span: &Span) -> SamplingProfile {
        if span.observed_count() < 2 {
            return SamplingProfile::indeterminate(&span.span_id);
        }
        let nominal = match self.expected_interval.or_else(|| nominal_interval(span)) {
            Some(n) if !n.is_zero() => n,
            _ => return SamplingProfile::indeterminate(&span.span_id),
        };
        let tolerance = nominal.mul_f64(self.tolerance_multiplier);
        SamplingProfile::determinate(&span.span_id, nominal, tolerance)
    }

    /// Analyze one span's observed records.
    pub fn analyze(&self, span: &Span) -> ContinuityReport {
        let profile = self.profile(span);
        let time_range = span.time_range();
        let observed_count = span.observed_count() as u64;

        let (Some(nominal), Some(tolerance)) = (profile.nominal_interval, profile.tolerance)
        else {
            debug!(span = %span.span_id, records = observed_count, "indeterminate sampling");
            return ContinuityReport {
                profile,
                gaps: Vec::new(),
                time_range,
                expected_count: observed_count,
                observed_count,
            };
        };

        let observed: Vec<_> = span.observed().collect();
        let mut gaps = Vec::new();
        for pair in observed.windows(2) {
            let (prev, next) = (pair[0].timestamp, pair[1].timestamp);
            let delta = next - prev;
            if Interval::from_delta(delta) <= tolerance {
                continue;
            }
            let steps = nominal.steps_in(delta).unwrap_or(2);
            gaps.push(Gap {
                span_id: span.span_id.clone(),
                start: prev,
                end: next,
                missing_count: (steps - 1).max(1) as u64,
            });
        }

        let expected_count = time_range
            .and_then(|r| nominal.steps_in(r.duration()))
            .map_or(observed_count, |steps| steps.max(0) as u64 + 1);

        debug!(
            span = %span.span_id,
            nominal = %nominal,
            gaps = gaps.len(),
            "continuity analyzed"
        );

        ContinuityReport {
            profile,
            gaps,
            time_range,
            expected_count,
            observed_count,
        }
    }
}

impl Default for ContinuityAnalyzer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_GAP_TOLERANCE, None)
    }
}
