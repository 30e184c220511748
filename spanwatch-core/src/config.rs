//! Analysis configuration.
//!
//! Every tunable of the pipeline lives here. The struct deserializes with
//! defaults for any missing key, so a config file only needs to name what it
//! changes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spanwatch_types::{AlertRule, Interval, RuleScope};

use crate::error::{AnalysisError, Result};
use crate::timestamp::TimestampParser;

/// Default multiplier of the nominal interval above which a delta is a gap.
pub const DEFAULT_GAP_TOLERANCE: f64 = 1.5;

/// Vendor encodings of "no sample".
pub const DEFAULT_NULL_SENTINELS: &[&str] = &["NS", "-99.95", "-99.9", "-40.0", ""];

/// Canonical KPI names and the vendor column headers that carry them.
///
/// The first variant present in the input wins.
pub const DEFAULT_METRIC_ALIASES: &[(&str, &[&str])] = &[
    ("cd", &["CDR", "CDR-AVG", "CD"]),
    ("osnr", &["ESNR-AVG", "ESNR_AVG", "ESNR", "OSNR", "OSNR-AVG"]),
    ("post_fec_ber", &["POST-FEC", "POSTFEC"]),
    ("pre_fec_ber", &["PREFEC-AVG", "PRE-FEC", "PRE-FEC-AVG"]),
    ("qfactor", &["QFACTOR-AVG", "QFACTOR", "QFACTOR_AVG"]),
    ("rx_power", &["OPR-AVG", "TOPR-AVG", "TOPT-AVG", "TOPRL-AVG"]),
];

/// Timestamp formats tried in order when none are configured.
pub const DEFAULT_TIMESTAMP_FORMATS: &[&str] = &[
    "rfc3339",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// How input columns map onto span ids, timestamps and metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    /// Column holding the sample time.
    pub timestamp_column: String,
    /// Column holding the span identifier.
    pub span_column: String,
    /// Columns that are neither metrics nor keys.
    pub ignored_columns: Vec<String>,
    /// Canonical metric name to vendor header variants.
    pub metric_aliases: BTreeMap<String, Vec<String>>,
    /// Cell values meaning "no sample"; they become nulls, not parse errors.
    pub null_sentinels: Vec<String>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            timestamp_column: "Time".to_string(),
            span_column: "TP".to_string(),
            ignored_columns: vec!["NE".to_string()],
            metric_aliases: DEFAULT_METRIC_ALIASES
                .iter()
                .map(|(name, variants)| {
                    (
                        name.to_string(),
                        variants.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
            null_sentinels: DEFAULT_NULL_SENTINELS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Configuration for one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Reindex each span onto its nominal grid, inserting null placeholders.
    pub resample_enabled: bool,
    /// A delta above `multiplier × nominal_interval` is a gap.
    pub gap_tolerance_multiplier: f64,
    /// Timestamp formats, tried in order.
    pub accepted_timestamp_formats: Vec<String>,
    /// Rules evaluated in list order.
    pub alert_rules: Vec<AlertRule>,
    /// Fixed sampling interval; when unset it is inferred per span.
    #[serde(with = "opt_interval")]
    pub expected_interval: Option<Interval>,
    /// Worker threads for per-span analysis; 1 runs inline.
    pub parallelism: usize,
    pub columns: ColumnConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            resample_enabled: false,
            gap_tolerance_multiplier: DEFAULT_GAP_TOLERANCE,
            accepted_timestamp_formats: DEFAULT_TIMESTAMP_FORMATS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            alert_rules: Vec::new(),
            expected_interval: None,
            parallelism: 1,
            columns: ColumnConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Check every value that can be checked without input data.
    ///
    /// Rules referencing metrics absent from the input are caught later, when
    /// the input's columns are known but before any span is processed.
    pub fn validate(&self) -> Result<()> {
        let tol = self.gap_tolerance_multiplier;
        if !tol.is_finite() || tol < 1.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "gap_tolerance_multiplier must be a finite number >= 1.0, got {tol}"
            )));
        }

        if self.parallelism == 0 {
            return Err(AnalysisError::InvalidConfig(
                "parallelism must be at least 1".to_string(),
            ));
        }

        if let Some(interval) = self.expected_interval {
            if interval.is_zero() {
                return Err(AnalysisError::InvalidConfig(
                    "expected_interval must be greater than zero".to_string(),
                ));
            }
        }

        let cols = &self.columns;
        if cols.timestamp_column.trim().is_empty() || cols.span_column.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig(
                "timestamp_column and span_column must be set".to_string(),
            ));
        }
        if cols.timestamp_column == cols.span_column {
            return Err(AnalysisError::InvalidConfig(format!(
                "timestamp_column and span_column are both {:?}",
                cols.timestamp_column
            )));
        }

        TimestampParser::new(&self.accepted_timestamp_formats)?;

        for (index, rule) in self.alert_rules.iter().enumerate() {
            validate_rule(index, rule)?;
        }

        Ok(())
    }
}

fn validate_rule(index: usize, rule: &AlertRule) -> Result<()> {
    let invalid = |reason: String| AnalysisError::InvalidRule { index, reason };

    if rule.metric_name.trim().is_empty() {
        return Err(invalid("metric_name is empty".to_string()));
    }
    if !rule.threshold.is_finite() {
        return Err(invalid(format!("threshold {} is not finite", rule.threshold)));
    }
    if let RuleScope::Deviation { baseline } = rule.scope {
        if baseline == spanwatch_types::AggregateField::StdDev {
            return Err(invalid("std_dev cannot be a deviation baseline".to_string()));
        }
    }
    Ok(())
}

/// Serde adapter accepting `"15m"`-style strings or integer microseconds.
mod opt_interval {
    use serde::{Deserialize, Deserializer, Serializer};
    use spanwatch_types::Interval;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Micros(u64),
    }

    pub fn serialize<S: Serializer>(value: &Option<Interval>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(i) => s.serialize_str(&i.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Interval>, D::Error> {
        match Option::<Repr>::deserialize(d)? {
            None => Ok(None),
            Some(Repr::Micros(us)) => Ok(Some(Interval::from_micros(us))),
            Some(Repr::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Repr::Text(s)) => Interval::parse(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
