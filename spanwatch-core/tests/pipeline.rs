//! End-to-end behaviour of the analysis pipeline.

use chrono::{DateTime, TimeZone, Utc};
use spanwatch_core::{AnalysisConfig, AnalysisError, Pipeline};
use spanwatch_types::{
    AggregateField, AlertRule, AlertTime, Comparator, Interval, RawBatch, RawValue, RuleScope,
    Severity, TimeRange,
};

fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

fn epoch_config() -> AnalysisConfig {
    AnalysisConfig {
        accepted_timestamp_formats: vec!["epoch_s".to_string()],
        ..Default::default()
    }
}

/// Span S1: records at 0, 60, 120 and 240 s with osnr 20, 21, null, 18.
fn s1_batch() -> RawBatch {
    RawBatch::builder()
        .row([("TP", "S1"), ("Time", "0"), ("osnr", "20")])
        .row([("TP", "S1"), ("Time", "60"), ("osnr", "21")])
        .row([("TP", "S1"), ("Time", "120"), ("osnr", "")])
        .row([("TP", "S1"), ("Time", "240"), ("osnr", "18")])
        .build()
}

#[test]
fn scenario_s1_continuity_and_kpis() {
    let summary = Pipeline::new(epoch_config()).unwrap().run(&s1_batch()).unwrap();

    assert_eq!(summary.span_count, 1);
    assert_eq!(summary.total_records, 4);
    assert_eq!(summary.run_time_range, TimeRange::new(ts(0), ts(240)));

    let overview = summary.span("S1").unwrap();
    assert_eq!(overview.profile.nominal_interval, Some(Interval::from_secs(60)));
    assert_eq!(overview.expected_count, 5);
    assert_eq!(overview.missing_count, 1);

    assert_eq!(summary.gaps.len(), 1);
    let gap = &summary.gaps[0];
    assert_eq!((gap.start, gap.end), (ts(120), ts(240)));
    assert_eq!(gap.missing_count, 1);

    let kpi = summary.kpi("S1", "osnr").unwrap();
    assert_eq!(kpi.sample_count, 3);
    let mean = kpi.get(AggregateField::Mean).unwrap();
    assert!((mean - 19.67).abs() < 0.01);
}

#[test]
fn scenario_s1_critical_alert() {
    let config = AnalysisConfig {
        alert_rules: vec![AlertRule::new("osnr", Comparator::Lt, 19.0, Severity::Critical)],
        ..epoch_config()
    };
    let summary = Pipeline::new(config).unwrap().run(&s1_batch()).unwrap();

    assert_eq!(summary.alerts.len(), 1);
    let alert = &summary.alerts[0];
    assert_eq!(alert.span_id, "S1");
    assert_eq!(alert.at, AlertTime::Instant(ts(240)));
    assert_eq!(alert.observed_value, 18.0);
    assert_eq!(summary.alert_count(Severity::Critical), 1);
}

#[test]
fn greater_than_fires_iff_value_exceeds_threshold() {
    let values = [Some(0.5), None, Some(1.0), Some(1.0000001), Some(-3.0), Some(7.0)];
    let mut builder = RawBatch::builder();
    for (i, v) in values.iter().enumerate() {
        let time = RawValue::Number(i as f64 * 60.0);
        let cell = v.map_or(RawValue::Empty, RawValue::Number);
        builder = builder.row([
            ("TP", RawValue::from("a")),
            ("Time", time),
            ("ber", cell),
        ]);
    }
    let config = AnalysisConfig {
        alert_rules: vec![AlertRule::new("ber", Comparator::Gt, 1.0, Severity::Warning)],
        ..epoch_config()
    };
    let summary = Pipeline::new(config).unwrap().run(&builder.build()).unwrap();

    let fired: Vec<_> = summary.alerts.iter().map(|a| a.observed_value).collect();
    let expected: Vec<_> = values.iter().flatten().copied().filter(|v| *v > 1.0).collect();
    assert_eq!(fired, expected);
}

#[test]
fn span_survival_counts_only_spans_with_valid_records() {
    let batch = RawBatch::builder()
        .row([("TP", "good"), ("Time", "0"), ("osnr", "20")])
        .row([("TP", "bad-times"), ("Time", "never"), ("osnr", "20")])
        .row([("TP", "bad-times"), ("Time", ""), ("osnr", "21")])
        .row([("TP", "single"), ("Time", "60"), ("osnr", "x")])
        .build();
    let summary = Pipeline::new(epoch_config()).unwrap().run(&batch).unwrap();

    assert_eq!(summary.span_count, 2);
    assert_eq!(summary.diagnostics.dropped_spans, vec!["bad-times".to_string()]);
    assert_eq!(summary.diagnostics.timestamp_parse_errors, 2);
    assert_eq!(summary.diagnostics.metric_parse_errors, 1);
    assert_eq!(
        summary.diagnostics.indeterminate_spans,
        vec!["good".to_string(), "single".to_string()]
    );
    assert!(summary.gaps.is_empty());
}

#[test]
fn all_null_metric_reports_undefined_aggregates() {
    let batch = RawBatch::builder()
        .row([("TP", "a"), ("Time", "0"), ("osnr", "20"), ("cd", "NS")])
        .row([("TP", "a"), ("Time", "60"), ("osnr", "21"), ("cd", "-99.9")])
        .build();
    let summary = Pipeline::new(epoch_config()).unwrap().run(&batch).unwrap();

    let cd = summary.kpi("a", "cd").unwrap();
    assert_eq!(cd.sample_count, 0);
    assert!(cd.is_undefined());
    assert_eq!(cd.get(AggregateField::Mean), None);
    assert_eq!(cd.get(AggregateField::Min), None);
}

#[test]
fn zero_surviving_spans_is_fatal() {
    let batch = RawBatch::builder()
        .row([("TP", "a"), ("Time", "garbage"), ("osnr", "20")])
        .row([("TP", ""), ("Time", "0"), ("osnr", "20")])
        .build();
    let err = Pipeline::new(epoch_config()).unwrap().run(&batch).unwrap_err();
    assert!(matches!(err, AnalysisError::NoSpans { dropped: 1 }));
    assert!(!err.is_config_error());
}

#[test]
fn unknown_metric_fails_before_processing() {
    let config = AnalysisConfig {
        alert_rules: vec![AlertRule::new("qfactor", Comparator::Lt, 6.0, Severity::Warning)],
        ..epoch_config()
    };
    let err = Pipeline::new(config).unwrap().run(&s1_batch()).unwrap_err();
    assert!(matches!(err, AnalysisError::UnknownMetric { index: 0, .. }));
    assert!(err.is_config_error());
}

#[test]
fn determinism_across_parallelism() {
    let mut builder = RawBatch::builder();
    // Span ids deliberately out of order, with gaps and duplicates.
    for span in ["z", "m", "a", "q", "c", "k"] {
        for t in [0usize, 900, 1800, 1800, 4500, 5400, 9000] {
            let time = t.to_string();
            let osnr = format!("{}", 15 + (t / 900 + span.len()) % 5);
            builder = builder.row([
                ("TP", span),
                ("Time", time.as_str()),
                ("ESNR-AVG", osnr.as_str()),
            ]);
        }
    }
    let batch = builder.build();
    let rules = vec![
        AlertRule::new("osnr", Comparator::Lt, 17.0, Severity::Warning),
        AlertRule::new("osnr", Comparator::Gt, 16.0, Severity::Critical).with_scope(
            RuleScope::Aggregate {
                field: AggregateField::P95,
            },
        ),
    ];

    let run = |parallelism| {
        let config = AnalysisConfig {
            alert_rules: rules.clone(),
            resample_enabled: true,
            parallelism,
            ..epoch_config()
        };
        let summary = Pipeline::new(config).unwrap().run(&batch).unwrap();
        serde_json::to_string(&summary).unwrap()
    };

    let baseline = run(1);
    for parallelism in [2, 3, 8] {
        assert_eq!(run(parallelism), baseline);
    }
}

#[test]
fn resampling_inserts_placeholders_without_double_reporting() {
    let config = AnalysisConfig {
        resample_enabled: true,
        ..epoch_config()
    };
    let summary = Pipeline::new(config).unwrap().run(&s1_batch()).unwrap();

    assert_eq!(summary.diagnostics.placeholders_inserted, 1);
    assert_eq!(summary.total_records, 4);
    let overview = summary.span("S1").unwrap();
    assert_eq!(overview.placeholder_count, 1);
    assert_eq!(summary.gaps.len(), 1);
    assert_eq!(summary.gaps[0].missing_count, 1);
    assert_eq!(summary.kpi("S1", "osnr").unwrap().sample_count, 3);
}

#[test]
fn expected_interval_overrides_inferred_cadence() {
    let config = AnalysisConfig {
        expected_interval: Some(Interval::from_secs(30)),
        ..epoch_config()
    };
    let summary = Pipeline::new(config).unwrap().run(&s1_batch()).unwrap();

    // Every 60 s step now hides one 30 s sample; 120 to 240 hides three.
    assert_eq!(summary.gaps.len(), 3);
    assert_eq!(summary.total_missing(), 5);
}

#[test]
fn vendor_headers_and_datetime_strings() {
    let batch = RawBatch::builder()
        .row([("NE", "ne-1"), ("TP", "OCH-1-1"), ("Time", "2024-01-01 00:00:00"), ("ESNR-AVG", "20.5"), ("PRE-FEC", "1.2E-04")])
        .row([("NE", "ne-1"), ("TP", "OCH-1-1"), ("Time", "2024-01-01 00:15:00"), ("ESNR-AVG", "20.1"), ("PRE-FEC", "2.0E-03")])
        .row([("NE", "ne-1"), ("TP", "OCH-1-1"), ("Time", "2024-01-01 00:30:00"), ("ESNR-AVG", "NS"), ("PRE-FEC", "1.1E-04")])
        .build();
    let config = AnalysisConfig {
        alert_rules: AlertRule::optical_defaults()
            .into_iter()
            .filter(|r| r.metric_name == "osnr" || r.metric_name == "pre_fec_ber")
            .collect(),
        ..Default::default()
    };
    let summary = Pipeline::new(config).unwrap().run(&batch).unwrap();

    assert_eq!(summary.metrics, vec!["osnr".to_string(), "pre_fec_ber".to_string()]);
    assert_eq!(
        summary.span("OCH-1-1").unwrap().profile.nominal_interval,
        Some(Interval::from_mins(15))
    );
    assert_eq!(summary.kpi("OCH-1-1", "osnr").unwrap().sample_count, 2);
    assert_eq!(summary.alerts.len(), 1);
    assert_eq!(summary.alerts[0].metric_name, "pre_fec_ber");
    assert!(summary.diagnostics.is_clean());
}
