//! The analysis pipeline: the single entry point from raw rows to [`Summary`].

use std::collections::BTreeMap;
use std::thread;

use spanwatch_types::{KpiResult, RawBatch, Span, Summary};
use tracing::{debug, info, warn};

use crate::alert::{AlertEvaluator, SpanInput};
use crate::config::AnalysisConfig;
use crate::continuity::{ContinuityAnalyzer, ContinuityReport};
use crate::error::{AnalysisError, Result};
use crate::kpi;
use crate::normalize::{ColumnPlan, Normalizer};
use crate::summary;

/// Continuity and KPI results for one span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpanAnalysis {
    pub span_id: String,
    /// Observed records.
    pub record_count: u64,
    pub placeholder_count: u64,
    pub continuity: ContinuityReport,
    pub kpis: Vec<KpiResult>,
}

/// Run the per-span stages on one span.
pub fn analyze_span(span: &Span, continuity: &ContinuityAnalyzer) -> SpanAnalysis {
    SpanAnalysis {
        span_id: span.span_id.clone(),
        record_count: span.observed_count() as u64,
        placeholder_count: span.placeholder_count() as u64,
        continuity: continuity.analyze(span),
        kpis: kpi::compute_span_kpis(span),
    }
}

/// A validated, reusable analysis pipeline.
///
/// ```rust
/// use spanwatch_core::{AnalysisConfig, Pipeline};
/// use spanwatch_types::RawBatch;
///
/// let config = AnalysisConfig {
///     accepted_timestamp_formats: vec!["epoch_s".to_string()],
///     ..Default::default()
/// };
/// let pipeline = Pipeline::new(config).unwrap();
///
/// let batch = RawBatch::builder()
///     .row([("TP", "S1"), ("Time", "0"), ("osnr", "20")])
///     .row([("TP", "S1"), ("Time", "60"), ("osnr", "21")])
///     .build();
/// let summary = pipeline.run(&batch).unwrap();
/// assert_eq!(summary.span_count, 1);
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    normalizer: Normalizer,
    continuity: ContinuityAnalyzer,
    alerts: AlertEvaluator,
}

impl Pipeline {
    /// Validate the configuration and build the stages.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(&config)?,
            continuity: ContinuityAnalyzer::from_config(&config),
            alerts: AlertEvaluator::new(config.alert_rules.clone()),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyze one batch.
    ///
    /// Configuration problems that depend on the input, such as a rule naming
    /// a metric the batch does not carry, fail here before any span is
    /// processed.
    pub fn run(&self, batch: &RawBatch) -> Result<Summary> {
        if batch.is_empty() {
            return Err(AnalysisError::NoInput);
        }

        let plan = self.normalizer.plan(batch);
        self.check_rule_metrics(&plan)?;

        let normalized = self.normalizer.normalize(batch, &plan);
        if normalized.spans.is_empty() {
            return Err(AnalysisError::NoSpans {
                dropped: normalized.diagnostics.dropped_spans.len(),
            });
        }

        let analyses = self.analyze_spans(&normalized.spans);

        let alerts = {
            let inputs: Vec<SpanInput<'_>> = normalized
                .spans
                .values()
                .zip(&analyses)
                .map(|(span, analysis)| SpanInput::new(span, &analysis.kpis))
                .collect();
            self.alerts.evaluate(&inputs)
        };

        let summary =
            summary::aggregate(analyses, alerts, normalized.metrics, normalized.diagnostics)?;

        for id in &summary.diagnostics.indeterminate_spans {
            warn!(span = %id, "sampling interval indeterminate, gap detection skipped");
        }
        info!(
            spans = summary.span_count,
            records = summary.total_records,
            gaps = summary.gaps.len(),
            alerts = summary.alerts.len(),
            "analysis complete"
        );
        Ok(summary)
    }

    fn check_rule_metrics(&self, plan: &ColumnPlan) -> Result<()> {
        for (index, rule) in self.config.alert_rules.iter().enumerate() {
            if !plan.has_metric(&rule.metric_name) {
                return Err(AnalysisError::UnknownMetric {
                    index,
                    metric: rule.metric_name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Per-span analysis in span-id order, on up to `parallelism` threads.
    fn analyze_spans(&self, spans: &BTreeMap<String, Span>) -> Vec<SpanAnalysis> {
        let spans: Vec<&Span> = spans.values().collect();
        let workers = self.config.parallelism.clamp(1, spans.len().max(1));
        let continuity = &self.continuity;

        if workers == 1 {
            return spans
                .iter()
                .map(|span| analyze_span(span, continuity))
                .collect();
        }

        let chunk_size = spans.len().div_ceil(workers);
        debug!(workers, chunk_size, "analyzing spans in parallel");

        let mut analyses: Vec<SpanAnalysis> = thread::scope(|scope| {
            let handles: Vec<_> = spans
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|span| analyze_span(span, continuity))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            let mut merged = Vec::with_capacity(spans.len());
            for handle in handles {
                match handle.join() {
                    Ok(part) => merged.extend(part),
                    Err(panic) => std::panic::resume_unwind(panic),
                }
            }
            merged
        });

        analyses.sort_by(|a, b| a.span_id.cmp(&b.span_id));
        analyses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spanwatch_types::{AlertRule, Comparator, Severity};

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            accepted_timestamp_formats: vec!["epoch_s".to_string()],
            ..Default::default()
        }
    }

    fn batch(spans: usize) -> RawBatch {
        let mut builder = RawBatch::builder();
        for s in 0..spans {
            for t in 0..5 {
                let id = format!("span-{s:02}");
                let time = (t * 60).to_string();
                let osnr = (15 + (s + t) % 7).to_string();
                builder = builder.row([
                    ("TP", id.as_str()),
                    ("Time", time.as_str()),
                    ("osnr", osnr.as_str()),
                ]);
            }
        }
        builder.build()
    }

    #[test]
    fn empty_batch_is_fatal() {
        let pipeline = Pipeline::new(config()).unwrap();
        assert!(matches!(
            pipeline.run(&RawBatch::new()),
            Err(AnalysisError::NoInput)
        ));
    }

    #[test]
    fn unknown_rule_metric_is_fatal() {
        let config = AnalysisConfig {
            alert_rules: vec![
                AlertRule::new("osnr", Comparator::Lt, 15.0, Severity::Warning),
                AlertRule::new("rx_power", Comparator::Lt, -20.0, Severity::Critical),
            ],
            ..config()
        };
        let pipeline = Pipeline::new(config).unwrap();
        match pipeline.run(&batch(1)) {
            Err(AnalysisError::UnknownMetric { index, metric }) => {
                assert_eq!(index, 1);
                assert_eq!(metric, "rx_power");
            }
            other => panic!("expected UnknownMetric, got {other:?}"),
        }
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        let config = AnalysisConfig {
            gap_tolerance_multiplier: -1.0,
            ..config()
        };
        assert!(Pipeline::new(config).is_err());
    }

    #[test]
    fn parallel_matches_sequential() {
        let input = batch(9);
        let rules = vec![AlertRule::new("osnr", Comparator::Lt, 17.0, Severity::Warning)];
        let sequential = Pipeline::new(AnalysisConfig {
            alert_rules: rules.clone(),
            ..config()
        })
        .unwrap()
        .run(&input)
        .unwrap();

        for parallelism in [2, 4, 16] {
            let parallel = Pipeline::new(AnalysisConfig {
                alert_rules: rules.clone(),
                parallelism,
                ..config()
            })
            .unwrap()
            .run(&input)
            .unwrap();
            assert_eq!(parallel, sequential, "parallelism = {parallelism}");
        }
        assert_eq!(sequential.span_count, 9);
    }
}
