//! Alert rules and the alert records they produce.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, Utc};

use crate::{AggregateField, TimeRange};

/// Threshold comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Comparator {
    #[cfg_attr(feature = "serde", serde(rename = ">", alias = "gt"))]
    Gt,
    #[cfg_attr(feature = "serde", serde(rename = ">=", alias = "ge", alias = "gte"))]
    Ge,
    #[cfg_attr(feature = "serde", serde(rename = "<", alias = "lt"))]
    Lt,
    #[cfg_attr(feature = "serde", serde(rename = "<=", alias = "le", alias = "lte"))]
    Le,
}

impl Comparator {
    /// Whether `value` breaches `threshold` under this comparator.
    pub fn breaches(&self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Gt => value > threshold,
            Comparator::Ge => value >= threshold,
            Comparator::Lt => value < threshold,
            Comparator::Le => value <= threshold,
        }
    }

    /// Operator symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparator::Gt => ">",
            Comparator::Ge => ">=",
            Comparator::Lt => "<",
            Comparator::Le => "<=",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" | "gt" => Ok(Comparator::Gt),
            ">=" | "ge" | "gte" => Ok(Comparator::Ge),
            "<" | "lt" => Ok(Comparator::Lt),
            "<=" | "le" | "lte" => Ok(Comparator::Le),
            other => Err(format!("unknown comparator: {other}")),
        }
    }
}

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Warning => "WARN",
            Severity::Critical => "CRIT",
        }
    }

    /// Lowercase name used in exports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a rule's comparator is applied to.
///
/// This is a closed set: a new kind of rule is a new variant here, handled
/// exhaustively by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum RuleScope {
    /// Every non-null sample of the metric.
    #[default]
    Sample,
    /// One aggregate of the span's KPI result, once per span.
    Aggregate {
        #[cfg_attr(feature = "serde", serde(default))]
        field: AggregateField,
    },
    /// Every non-null sample, as its difference from a span aggregate.
    Deviation {
        #[cfg_attr(feature = "serde", serde(default = "default_baseline"))]
        baseline: AggregateField,
    },
}

#[cfg(feature = "serde")]
fn default_baseline() -> AggregateField {
    AggregateField::P50
}

impl RuleScope {
    /// Short name used in exports.
    pub fn label(&self) -> String {
        match self {
            RuleScope::Sample => "sample".to_string(),
            RuleScope::Aggregate { field } => format!("aggregate:{field}"),
            RuleScope::Deviation { baseline } => format!("deviation:{baseline}"),
        }
    }
}

/// A threshold rule over one metric. Configuration input; never mutated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertRule {
    /// Canonical metric name the rule applies to.
    #[cfg_attr(feature = "serde", serde(alias = "metric"))]
    pub metric_name: String,
    pub comparator: Comparator,
    pub threshold: f64,
    pub severity: Severity,
    #[cfg_attr(feature = "serde", serde(default))]
    pub scope: RuleScope,
}

impl AlertRule {
    /// Create a per-sample rule.
    pub fn new(
        metric_name: impl Into<String>,
        comparator: Comparator,
        threshold: f64,
        severity: Severity,
    ) -> Self {
        Self {
            metric_name: metric_name.into(),
            comparator,
            threshold,
            severity,
            scope: RuleScope::Sample,
        }
    }

    /// Change the rule's scope (builder style).
    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    /// Conservative starting rules for coherent optical links.
    ///
    /// OSNR below 15 dB and pre-FEC BER above 1e-3 are warnings; a Q-factor
    /// more than 1 dB under the span median is critical. Chromatic dispersion
    /// drifting more than 1000 ps/nm either side of the span median is a
    /// warning, expressed as one rule per direction.
    pub fn optical_defaults() -> Vec<AlertRule> {
        let median = RuleScope::Deviation {
            baseline: AggregateField::P50,
        };
        vec![
            AlertRule::new("osnr", Comparator::Lt, 15.0, Severity::Warning),
            AlertRule::new("pre_fec_ber", Comparator::Gt, 1e-3, Severity::Warning),
            AlertRule::new("qfactor", Comparator::Lt, -1.0, Severity::Critical).with_scope(median),
            AlertRule::new("cd", Comparator::Gt, 1000.0, Severity::Warning).with_scope(median),
            AlertRule::new("cd", Comparator::Lt, -1000.0, Severity::Warning).with_scope(median),
        ]
    }
}

impl fmt::Display for AlertRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} [{}]",
            self.metric_name,
            self.scope.label(),
            self.comparator,
            self.threshold,
            self.severity
        )
    }
}

/// When an alert applies: a single sample or a whole aggregation window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AlertTime {
    Instant(DateTime<Utc>),
    Window(TimeRange),
}

/// One breach of one rule.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertRecord {
    pub span_id: String,
    pub metric_name: String,
    pub at: AlertTime,
    /// Value the comparator was applied to.
    pub observed_value: f64,
    /// Baseline subtracted from the sample, for deviation rules.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none", default))]
    pub baseline: Option<f64>,
    pub rule: AlertRule,
    pub severity: Severity,
}
