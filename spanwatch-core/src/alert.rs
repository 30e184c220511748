//! Alert evaluation.
//!
//! Alerts are emitted in rule-list order, then span order, then record
//! timestamp order. Every breaching sample is its own alert.

use spanwatch_types::{AlertRecord, AlertRule, AlertTime, KpiResult, RuleScope, Span};
use tracing::debug;

/// One span and its KPI results, as the evaluator sees them.
#[derive(Debug, Clone, Copy)]
pub struct SpanInput<'a> {
    pub span: &'a Span,
    pub kpis: &'a [KpiResult],
}

impl<'a> SpanInput<'a> {
    pub fn new(span: &'a Span, kpis: &'a [KpiResult]) -> Self {
        Self { span, kpis }
    }

    fn kpi(&self, metric: &str) -> Option<&'a KpiResult> {
        self.kpis.iter().find(|k| k.metric_name == metric)
    }
}

/// Applies a fixed rule list to spans.
#[derive(Debug, Clone, Default)]
pub struct AlertEvaluator {
    rules: Vec<AlertRule>,
}

impl AlertEvaluator {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Evaluate every rule against every span, in the order given.
    pub fn evaluate(&self, spans: &[SpanInput<'_>]) -> Vec<AlertRecord> {
        let mut alerts = Vec::new();
        for rule in &self.rules {
            let before = alerts.len();
            for input in spans {
                evaluate_rule(rule, input, &mut alerts);
            }
            debug!(rule = %rule, alerts = alerts.len() - before, "rule evaluated");
        }
        alerts
    }
}

fn evaluate_rule(rule: &AlertRule, input: &SpanInput<'_>, out: &mut Vec<AlertRecord>) {
    let span = input.span;
    let alert = |at: AlertTime, observed_value: f64, baseline: Option<f64>| AlertRecord {
        span_id: span.span_id.clone(),
        metric_name: rule.metric_name.clone(),
        at,
        observed_value,
        baseline,
        rule: rule.clone(),
        severity: rule.severity,
    };

    match rule.scope {
        RuleScope::Sample => {
            for record in &span.records {
                let Some(value) = record.value(&rule.metric_name) else {
                    continue;
                };
                if rule.comparator.breaches(value, rule.threshold) {
                    out.push(alert(AlertTime::Instant(record.timestamp), value, None));
                }
            }
        }
        RuleScope::Aggregate { field } => {
            let Some(kpi) = input.kpi(&rule.metric_name) else {
                return;
            };
            let (Some(value), Some(range)) = (kpi.get(field), kpi.time_range) else {
                return;
            };
            if rule.comparator.breaches(value, rule.threshold) {
                out.push(alert(AlertTime::Window(range), value, None));
            }
        }
        RuleScope::Deviation { baseline } => {
            let Some(base) = input.kpi(&rule.metric_name).and_then(|k| k.get(baseline)) else {
                return;
            };
            for record in &span.records {
                let Some(value) = record.value(&rule.metric_name) else {
                    continue;
                };
                let deviation = value - base;
                if rule.comparator.breaches(deviation, rule.threshold) {
                    out.push(alert(AlertTime::Instant(record.timestamp), deviation, Some(base)));
                }
            }
        }
    }
}
