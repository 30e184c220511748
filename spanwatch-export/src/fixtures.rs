use chrono::{DateTime, TimeZone, Utc};
use spanwatch_types::{
    AggregateField, Aggregates, AlertRecord, AlertRule, AlertTime, Comparator, Diagnostics, Gap,
    Interval, KpiResult, RuleScope, SamplingProfile, SchemaVersion, Severity, SpanOverview,
    Summary, TimeRange,
};

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_704_067_200 + secs, 0).unwrap()
}

fn aggregates(mean: f64) -> Aggregates {
    Aggregates {
        mean,
        min: mean - 2.0,
        max: mean + 1.0,
        p50: mean,
        p95: mean + 0.75,
        p99: mean + 0.95,
        std_dev: Some(0.5),
    }
}

fn overview(id: &str, records: u64, missing: u64) -> SpanOverview {
    SpanOverview {
        span_id: id.to_string(),
        record_count: records,
        placeholder_count: 0,
        time_range: TimeRange::new(ts(0), ts(3600)),
        profile: SamplingProfile::determinate(
            id,
            Interval::from_mins(15),
            Interval::from_secs(1350),
        ),
        expected_count: records + missing,
        missing_count: missing,
    }
}

/// Two spans: the first with a gap, an undefined metric and two alerts.
pub fn summary() -> Summary {
    let osnr_rule = AlertRule::new("osnr", Comparator::Lt, 19.0, Severity::Critical);
    let deviation_rule = AlertRule::new("osnr", Comparator::Lt, -1.0, Severity::Warning)
        .with_scope(RuleScope::Deviation {
            baseline: AggregateField::P50,
        });
    let mean_rule = AlertRule::new("osnr", Comparator::Gt, 21.0, Severity::Warning).with_scope(
        RuleScope::Aggregate {
            field: AggregateField::Mean,
        },
    );

    Summary {
        version: SchemaVersion::current(),
        run_time_range: TimeRange::new(ts(0), ts(3600)),
        span_count: 2,
        total_records: 8,
        metrics: vec!["cd".to_string(), "osnr".to_string()],
        spans: vec![overview("OCH-1-1", 4, 1), overview("OCH-1-2", 4, 0)],
        kpi_results: vec![
            KpiResult {
                span_id: "OCH-1-1".to_string(),
                metric_name: "cd".to_string(),
                aggregates: None,
                sample_count: 0,
                time_range: None,
            },
            KpiResult {
                span_id: "OCH-1-1".to_string(),
                metric_name: "osnr".to_string(),
                aggregates: Some(aggregates(19.5)),
                sample_count: 3,
                time_range: Some(TimeRange::new(ts(0), ts(3600))),
            },
            KpiResult {
                span_id: "OCH-1-2".to_string(),
                metric_name: "cd".to_string(),
                aggregates: Some(Aggregates {
                    std_dev: None,
                    ..aggregates(12.0)
                }),
                sample_count: 1,
                time_range: Some(TimeRange::instant(ts(900))),
            },
            KpiResult {
                span_id: "OCH-1-2".to_string(),
                metric_name: "osnr".to_string(),
                aggregates: Some(aggregates(22.25)),
                sample_count: 4,
                time_range: Some(TimeRange::new(ts(0), ts(3600))),
            },
        ],
        gaps: vec![Gap {
            span_id: "OCH-1-1".to_string(),
            start: ts(1800),
            end: ts(3600),
            missing_count: 1,
        }],
        alerts: vec![
            AlertRecord {
                span_id: "OCH-1-1".to_string(),
                metric_name: "osnr".to_string(),
                at: AlertTime::Instant(ts(3600)),
                observed_value: 18.0,
                baseline: None,
                rule: osnr_rule.clone(),
                severity: osnr_rule.severity,
            },
            AlertRecord {
                span_id: "OCH-1-1".to_string(),
                metric_name: "osnr".to_string(),
                at: AlertTime::Instant(ts(3600)),
                observed_value: -1.5,
                baseline: Some(19.5),
                rule: deviation_rule.clone(),
                severity: deviation_rule.severity,
            },
            AlertRecord {
                span_id: "OCH-1-2".to_string(),
                metric_name: "osnr".to_string(),
                at: AlertTime::Window(TimeRange::new(ts(0), ts(3600))),
                observed_value: 22.25,
                baseline: None,
                rule: mean_rule.clone(),
                severity: mean_rule.severity,
            },
        ],
        diagnostics: Diagnostics {
            rows_total: 9,
            duplicates_removed: 1,
            ..Default::default()
        },
    }
}
