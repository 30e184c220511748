//! Error types for the analysis pipeline.

use thiserror::Error;

/// Fatal errors that stop a run before any summary is produced.
///
/// Row, field and span-local problems are not errors; they are counted in
/// [`Diagnostics`](spanwatch_types::Diagnostics) instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// An alert rule is malformed.
    #[error("invalid alert rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    /// An alert rule names a metric the input does not carry.
    #[error("alert rule #{index} references unknown metric {metric:?}")]
    UnknownMetric { index: usize, metric: String },

    /// A timestamp format string is not usable.
    #[error("invalid timestamp format {0:?}")]
    InvalidTimestampFormat(String),

    /// Any other configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input batch has no rows at all.
    #[error("input contains no rows")]
    NoInput,

    /// Every span was dropped during normalization.
    #[error("no spans survived normalization ({dropped} dropped)")]
    NoSpans { dropped: usize },
}

impl AnalysisError {
    /// Whether this error comes from configuration rather than data.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidRule { .. }
                | AnalysisError::UnknownMetric { .. }
                | AnalysisError::InvalidTimestampFormat(_)
                | AnalysisError::InvalidConfig(_)
        )
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
