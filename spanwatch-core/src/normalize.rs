//! Normalization of raw rows into per-span record sequences.
//!
//! Each cell goes through an explicit [`ParseOutcome`]. Nothing here fails:
//! bad rows and fields are dropped or nulled and counted in [`Diagnostics`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use spanwatch_types::{Diagnostics, Interval, RawBatch, RawValue, Span, TelemetryRecord};
use tracing::{debug, info, warn};

use crate::config::{AnalysisConfig, ColumnConfig};
use crate::continuity;
use crate::error::Result;
use crate::timestamp::TimestampParser;

/// Resampling refuses grids larger than this many points per span.
pub const MAX_GRID_POINTS: i64 = 1_000_000;

/// Why a cell could not be read as a number.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseFailure {
    /// Text that is not a number.
    NonNumeric(String),
    /// NaN or infinity.
    NonFinite(f64),
}

/// Result of reading one field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<T> {
    Parsed(T),
    /// Empty cell or a "no sample" sentinel.
    Missing,
    Failed(ParseFailure),
}

impl<T> ParseOutcome<T> {
    /// The parsed value; `Missing` and `Failed` both read as null.
    pub fn value(self) -> Option<T> {
        match self {
            ParseOutcome::Parsed(v) => Some(v),
            ParseOutcome::Missing | ParseOutcome::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ParseOutcome::Failed(_))
    }
}

/// Read a metric cell, treating any of `sentinels` as a null.
///
/// Numeric sentinels such as `-99.9` also match cells the adapter already
/// read as numbers.
pub fn parse_metric(value: &RawValue, sentinels: &[String]) -> ParseOutcome<f64> {
    match value {
        RawValue::Empty => ParseOutcome::Missing,
        RawValue::Number(n) => {
            if sentinels
                .iter()
                .filter_map(|s| s.trim().parse::<f64>().ok())
                .any(|s| s == *n)
            {
                ParseOutcome::Missing
            } else if n.is_finite() {
                ParseOutcome::Parsed(*n)
            } else {
                ParseOutcome::Failed(ParseFailure::NonFinite(*n))
            }
        }
        RawValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() || sentinels.iter().any(|s| s.trim() == t) {
                return ParseOutcome::Missing;
            }
            match t.parse::<f64>() {
                Ok(n) if n.is_finite() => ParseOutcome::Parsed(n),
                Ok(n) => ParseOutcome::Failed(ParseFailure::NonFinite(n)),
                Err(_) => ParseOutcome::Failed(ParseFailure::NonNumeric(t.to_string())),
            }
        }
    }
}

/// Which input columns are metrics, and their canonical names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnPlan {
    /// Raw header to canonical metric name, in header order.
    metrics: Vec<(String, String)>,
}

impl ColumnPlan {
    /// Classify the batch's headers.
    ///
    /// Key and ignored columns are skipped. For each alias group the first
    /// variant present is renamed to the canonical name, unless a column
    /// already carries that name. Everything else keeps its trimmed header.
    pub fn resolve(columns: &[String], config: &ColumnConfig) -> Self {
        let trimmed: BTreeSet<&str> = columns.iter().map(|c| c.trim()).collect();

        let mut renames: BTreeMap<&str, &str> = BTreeMap::new();
        for (canonical, variants) in &config.metric_aliases {
            if trimmed.contains(canonical.as_str()) {
                continue;
            }
            if let Some(winner) = variants.iter().find(|v| trimmed.contains(v.trim())) {
                renames.insert(winner.trim(), canonical.as_str());
            }
        }

        let skip = |name: &str| {
            name.is_empty()
                || name == config.timestamp_column.trim()
                || name == config.span_column.trim()
                || config.ignored_columns.iter().any(|c| c.trim() == name)
        };

        let metrics = columns
            .iter()
            .filter(|c| !skip(c.trim()))
            .map(|c| {
                let name = c.trim();
                let canonical = renames.get(name).copied().unwrap_or(name);
                (c.clone(), canonical.to_string())
            })
            .collect();

        Self { metrics }
    }

    /// `(raw header, canonical name)` pairs.
    pub fn metric_columns(&self) -> &[(String, String)] {
        &self.metrics
    }

    /// Sorted canonical metric names.
    pub fn metric_names(&self) -> Vec<String> {
        let names: BTreeSet<&String> = self.metrics.iter().map(|(_, m)| m).collect();
        names.into_iter().cloned().collect()
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|(_, m)| m == name)
    }
}

/// Output of [`Normalizer::normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    /// Surviving spans by id.
    pub spans: BTreeMap<String, Span>,
    /// Sorted canonical metric names.
    pub metrics: Vec<String>,
    pub diagnostics: Diagnostics,
}

/// Result of placing one span on its grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    pub span: Span,
    /// Null records added at empty grid points.
    pub placeholders: u64,
    /// Records discarded because another record snapped to the same point.
    pub collisions: u64,
}

/// Reindex a span onto `start + k·interval` up to its last record.
///
/// Records snap to the nearest grid point, later records winning collisions.
/// Empty points get a placeholder with every name in `metric_names` null.
/// Spans with fewer than two records, and grids over [`MAX_GRID_POINTS`], are
/// returned unchanged.
pub fn resample(span: Span, interval: Interval, metric_names: &[String]) -> Resampled {
    let unchanged = |span| Resampled {
        span,
        placeholders: 0,
        collisions: 0,
    };

    let (Some(first), Some(last)) = (span.records.first(), span.records.last()) else {
        return unchanged(span);
    };
    if span.records.len() < 2 || interval.is_zero() {
        return unchanged(span);
    }
    let start = first.timestamp;
    let Some(last_step) = interval.steps_in(last.timestamp - start) else {
        return unchanged(span);
    };
    if last_step >= MAX_GRID_POINTS {
        warn!(
            span = %span.span_id,
            interval = %interval,
            points = last_step + 1,
            "grid too large, skipping resampling"
        );
        return unchanged(span);
    }

    let step = interval.to_delta();
    let grid_time = |k: i64| -> DateTime<Utc> { start + step * k as i32 };
    let span_id = span.span_id;

    let mut slots: BTreeMap<i64, TelemetryRecord> = BTreeMap::new();
    let mut collisions = 0;
    for mut record in span.records {
        let k = interval
            .steps_in(record.timestamp - start)
            .unwrap_or(0)
            .clamp(0, last_step);
        record.timestamp = grid_time(k);
        if slots.insert(k, record).is_some() {
            collisions += 1;
        }
    }

    let mut placeholders = 0;
    let mut records = Vec::with_capacity(last_step as usize + 1);
    for k in 0..=last_step {
        match slots.remove(&k) {
            Some(record) => records.push(record),
            None => {
                placeholders += 1;
                records.push(TelemetryRecord::placeholder(
                    span_id.as_str(),
                    grid_time(k),
                    metric_names,
                ));
            }
        }
    }

    Resampled {
        span: Span::new(span_id, records),
        placeholders,
        collisions,
    }
}

/// Turns a raw batch into sorted, deduplicated spans.
#[derive(Debug, Clone)]
pub struct Normalizer {
    columns: ColumnConfig,
    parser: TimestampParser,
    resample: bool,
    expected_interval: Option<Interval>,
}

impl Normalizer {
    pub fn new(config: &AnalysisConfig) -> Result<Self> {
        // Row keys are trimmed headers, so the key names must be too.
        let mut columns = config.columns.clone();
        columns.span_column = columns.span_column.trim().to_string();
        columns.timestamp_column = columns.timestamp_column.trim().to_string();
        Ok(Self {
            columns,
            parser: TimestampParser::new(&config.accepted_timestamp_formats)?,
            resample: config.resample_enabled,
            expected_interval: config.expected_interval,
        })
    }

    /// Column classification for a batch under this normalizer's config.
    pub fn plan(&self, batch: &RawBatch) -> ColumnPlan {
        ColumnPlan::resolve(&batch.columns, &self.columns)
    }

    pub fn normalize(&self, batch: &RawBatch, plan: &ColumnPlan) -> NormalizedBatch {
        let mut diagnostics = Diagnostics {
            rows_total: batch.len() as u64,
            ..Default::default()
        };
        let metrics = plan.metric_names();

        // Every span id seen, even if none of its rows survive.
        let mut discovered: BTreeMap<String, BTreeMap<DateTime<Utc>, TelemetryRecord>> =
            BTreeMap::new();

        for row in &batch.rows {
            let Some(span_id) = row.get(&self.columns.span_column).and_then(RawValue::as_text)
            else {
                diagnostics.rows_missing_span += 1;
                continue;
            };
            let records = discovered.entry(span_id.clone()).or_default();

            let Some(timestamp) = row
                .get(&self.columns.timestamp_column)
                .and_then(|v| self.parser.parse(v))
            else {
                diagnostics.timestamp_parse_errors += 1;
                continue;
            };

            let mut record = TelemetryRecord::new(span_id, timestamp);
            for (column, name) in plan.metric_columns() {
                let outcome = row
                    .get(column)
                    .map_or(ParseOutcome::Missing, |v| {
                        parse_metric(v, &self.columns.null_sentinels)
                    });
                if outcome.is_failed() {
                    diagnostics.metric_parse_errors += 1;
                }
                record.metrics.insert(name.clone(), outcome.value());
            }

            if records.insert(timestamp, record).is_some() {
                diagnostics.duplicates_removed += 1;
            }
        }

        if diagnostics.duplicates_removed > 0 {
            warn!(
                count = diagnostics.duplicates_removed,
                "removed duplicate (span, timestamp) rows, keeping the last"
            );
        }

        let mut spans = BTreeMap::new();
        for (span_id, records) in discovered {
            if records.is_empty() {
                warn!(span = %span_id, "span has no valid records, dropping");
                diagnostics.dropped_spans.push(span_id);
                continue;
            }
            let span = Span::new(span_id.clone(), records.into_values().collect());
            let span = if self.resample {
                self.resample_span(span, &metrics, &mut diagnostics)
            } else {
                span
            };
            spans.insert(span_id, span);
        }

        info!(
            rows = diagnostics.rows_total,
            spans = spans.len(),
            dropped = diagnostics.dropped_spans.len(),
            timestamp_errors = diagnostics.timestamp_parse_errors,
            metric_errors = diagnostics.metric_parse_errors,
            "normalized batch"
        );

        NormalizedBatch {
            spans,
            metrics,
            diagnostics,
        }
    }

    fn resample_span(&self, span: Span, metrics: &[String], diagnostics: &mut Diagnostics) -> Span {
        let interval = self
            .expected_interval
            .or_else(|| continuity::nominal_interval(&span));
        let Some(interval) = interval else {
            return span;
        };
        let resampled = resample(span, interval, metrics);
        debug!(
            span = %resampled.span.span_id,
            placeholders = resampled.placeholders,
            collisions = resampled.collisions,
            "resampled"
        );
        diagnostics.placeholders_inserted += resampled.placeholders;
        diagnostics.duplicates_removed += resampled.collisions;
        resampled.span
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use spanwatch_types::RecordOrigin;

    fn sentinels() -> Vec<String> {
        ColumnConfig::default().null_sentinels
    }

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn epoch_config() -> AnalysisConfig {
        AnalysisConfig {
            accepted_timestamp_formats: vec!["epoch_s".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn parse_outcomes() {
        let s = sentinels();
        assert_eq!(parse_metric(&RawValue::from("20.5"), &s), ParseOutcome::Parsed(20.5));
        assert_eq!(parse_metric(&RawValue::Number(3.0), &s), ParseOutcome::Parsed(3.0));
        assert_eq!(parse_metric(&RawValue::Empty, &s), ParseOutcome::Missing);
        assert_eq!(parse_metric(&RawValue::from("NS"), &s), ParseOutcome::Missing);
        assert_eq!(parse_metric(&RawValue::from(" -99.9 "), &s), ParseOutcome::Missing);
        assert_eq!(parse_metric(&RawValue::Number(-40.0), &s), ParseOutcome::Missing);
        assert_eq!(
            parse_metric(&RawValue::from("n/a"), &s),
            ParseOutcome::Failed(ParseFailure::NonNumeric("n/a".to_string()))
        );
        assert!(parse_metric(&RawValue::from("NaN"), &s).is_failed());
        assert!(parse_metric(&RawValue::Number(f64::INFINITY), &s).is_failed());
    }

    #[test]
    fn column_plan_applies_aliases() {
        let columns: Vec<String> = ["NE", "TP", "Time", "ESNR-AVG", "OSNR", "PRE-FEC", " Temp "]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let plan = ColumnPlan::resolve(&columns, &ColumnConfig::default());
        assert_eq!(
            plan.metric_columns(),
            &[
                ("ESNR-AVG".to_string(), "osnr".to_string()),
                ("OSNR".to_string(), "OSNR".to_string()),
                ("PRE-FEC".to_string(), "pre_fec_ber".to_string()),
                (" Temp ".to_string(), "Temp".to_string()),
            ]
        );
        assert!(plan.has_metric("osnr"));
        assert!(!plan.has_metric("NE"));
    }

    #[test]
    fn canonical_column_beats_alias() {
        let columns: Vec<String> = ["TP", "Time", "osnr", "ESNR"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let plan = ColumnPlan::resolve(&columns, &ColumnConfig::default());
        assert_eq!(plan.metric_names(), vec!["ESNR".to_string(), "osnr".to_string()]);
    }

    #[test]
    fn drops_bad_rows_and_nulls_bad_fields() {
        let batch = RawBatch::builder()
            .row([("TP", "a"), ("Time", "0"), ("osnr", "20")])
            .row([("TP", ""), ("Time", "60"), ("osnr", "21")])
            .row([("TP", "a"), ("Time", "later"), ("osnr", "21")])
            .row([("TP", "a"), ("Time", "60"), ("osnr", "bad")])
            .row([("TP", "b"), ("Time", "oops"), ("osnr", "1")])
            .build();
        let normalizer = Normalizer::new(&epoch_config()).unwrap();
        let out = normalizer.normalize(&batch, &normalizer.plan(&batch));

        assert_eq!(out.diagnostics.rows_total, 5);
        assert_eq!(out.diagnostics.rows_missing_span, 1);
        assert_eq!(out.diagnostics.timestamp_parse_errors, 2);
        assert_eq!(out.diagnostics.metric_parse_errors, 1);
        assert_eq!(out.diagnostics.dropped_spans, vec!["b".to_string()]);

        let a = &out.spans["a"];
        assert_eq!(a.records.len(), 2);
        assert_eq!(a.records[1].metrics.get("osnr"), Some(&None));
        assert!(!out.spans.contains_key("b"));
    }

    #[test]
    fn padded_key_column_names_still_match() {
        let batch = RawBatch::builder()
            .row([("TP", "a"), ("Time", "0"), ("osnr", "20")])
            .row([("TP", "a"), ("Time", "60"), ("osnr", "21")])
            .build();
        let mut config = epoch_config();
        config.columns.span_column = " TP".to_string();
        config.columns.timestamp_column = "Time ".to_string();
        let normalizer = Normalizer::new(&config).unwrap();
        let plan = normalizer.plan(&batch);
        let out = normalizer.normalize(&batch, &plan);

        assert_eq!(out.diagnostics.rows_missing_span, 0);
        assert_eq!(out.diagnostics.timestamp_parse_errors, 0);
        assert_eq!(out.spans["a"].records.len(), 2);
        assert_eq!(plan.metric_names(), vec!["osnr".to_string()]);
    }

    #[test]
    fn dedups_last_write_wins_and_sorts() {
        let batch = RawBatch::builder()
            .row([("TP", "a"), ("Time", "120"), ("osnr", "3")])
            .row([("TP", "a"), ("Time", "0"), ("osnr", "1")])
            .row([("TP", "a"), ("Time", "0"), ("osnr", "2")])
            .build();
        let normalizer = Normalizer::new(&epoch_config()).unwrap();
        let out = normalizer.normalize(&batch, &normalizer.plan(&batch));

        let a = &out.spans["a"];
        assert_eq!(out.diagnostics.duplicates_removed, 1);
        assert_eq!(a.records[0].timestamp, ts(0));
        assert_eq!(a.records[0].value("osnr"), Some(2.0));
        assert_eq!(a.records[1].timestamp, ts(120));
    }

    #[test]
    fn every_record_carries_every_metric() {
        let batch = RawBatch::builder()
            .row([("TP", "a"), ("Time", "0"), ("osnr", "1")])
            .row([("TP", "a"), ("Time", "60"), ("cd", "5")])
            .build();
        let normalizer = Normalizer::new(&epoch_config()).unwrap();
        let out = normalizer.normalize(&batch, &normalizer.plan(&batch));

        assert_eq!(out.metrics, vec!["cd".to_string(), "osnr".to_string()]);
        for r in &out.spans["a"].records {
            assert_eq!(r.metrics.len(), 2);
        }
    }

    #[test]
    fn resample_fills_grid() {
        let names = vec!["osnr".to_string()];
        let span = Span::new(
            "a",
            [0, 60, 122, 300]
                .iter()
                .map(|&s| TelemetryRecord::new("a", ts(s)).with_metric("osnr", Some(1.0)))
                .collect(),
        );
        let out = resample(span, Interval::from_secs(60), &names);

        let times: Vec<_> = out.span.records.iter().map(|r| r.timestamp).collect();
        assert_eq!(times, vec![ts(0), ts(60), ts(120), ts(180), ts(240), ts(300)]);
        assert_eq!(out.placeholders, 2);
        assert_eq!(out.collisions, 0);
        assert_eq!(out.span.records[3].origin, RecordOrigin::Placeholder);
        assert_eq!(out.span.records[3].metrics.get("osnr"), Some(&None));
        assert_eq!(out.span.observed_count(), 4);
    }

    #[test]
    fn resample_collisions_keep_latest() {
        let span = Span::new(
            "a",
            vec![
                TelemetryRecord::new("a", ts(0)).with_metric("osnr", Some(1.0)),
                TelemetryRecord::new("a", ts(50)).with_metric("osnr", Some(2.0)),
                TelemetryRecord::new("a", ts(70)).with_metric("osnr", Some(3.0)),
            ],
        );
        let out = resample(span, Interval::from_secs(60), &[]);
        assert_eq!(out.collisions, 1);
        assert_eq!(out.span.records.len(), 2);
        assert_eq!(out.span.records[1].value("osnr"), Some(3.0));
    }

    #[test]
    fn resample_leaves_single_record_spans() {
        let span = Span::new("a", vec![TelemetryRecord::new("a", ts(0))]);
        let out = resample(span.clone(), Interval::from_secs(60), &[]);
        assert_eq!(out.span, span);
        assert_eq!(out.placeholders, 0);
    }

    #[test]
    fn normalizer_resamples_when_enabled() {
        let batch = RawBatch::builder()
            .row([("TP", "a"), ("Time", "0"), ("osnr", "1")])
            .row([("TP", "a"), ("Time", "60"), ("osnr", "2")])
            .row([("TP", "a"), ("Time", "120"), ("osnr", "3")])
            .row([("TP", "a"), ("Time", "300"), ("osnr", "4")])
            .build();
        let config = AnalysisConfig {
            resample_enabled: true,
            ..epoch_config()
        };
        let normalizer = Normalizer::new(&config).unwrap();
        let out = normalizer.normalize(&batch, &normalizer.plan(&batch));

        assert_eq!(out.diagnostics.placeholders_inserted, 2);
        assert_eq!(out.spans["a"].records.len(), 6);
        assert_eq!(out.spans["a"].observed_count(), 4);
    }
}
