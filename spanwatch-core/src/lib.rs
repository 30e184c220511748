//! # spanwatch-core
//!
//! Analysis pipeline for optical span telemetry.
//!
//! A [`Pipeline`] takes a [`RawBatch`](spanwatch_types::RawBatch) of untyped
//! rows and produces one [`Summary`](spanwatch_types::Summary):
//!
//! 1. **Normalize**: parse timestamps and metrics, deduplicate, sort, and
//!    optionally resample each span onto its sampling grid.
//! 2. **Continuity**: infer each span's cadence and find gaps.
//! 3. **KPIs**: mean, min, max, percentiles and standard deviation per metric.
//! 4. **Alerts**: apply threshold rules to samples and aggregates.
//! 5. **Summary**: fold everything into the run-level result.
//!
//! ## Quick Start
//!
//! ```rust
//! use spanwatch_core::{AnalysisConfig, Pipeline};
//! use spanwatch_types::{AlertRule, Comparator, RawBatch, Severity};
//!
//! let config = AnalysisConfig {
//!     accepted_timestamp_formats: vec!["epoch_s".to_string()],
//!     alert_rules: vec![AlertRule::new("osnr", Comparator::Lt, 19.0, Severity::Critical)],
//!     ..Default::default()
//! };
//!
//! let batch = RawBatch::builder()
//!     .row([("TP", "S1"), ("Time", "0"), ("OSNR", "20")])
//!     .row([("TP", "S1"), ("Time", "60"), ("OSNR", "21")])
//!     .row([("TP", "S1"), ("Time", "120"), ("OSNR", "NS")])
//!     .row([("TP", "S1"), ("Time", "240"), ("OSNR", "18")])
//!     .build();
//!
//! let summary = Pipeline::new(config)?.run(&batch)?;
//!
//! assert_eq!(summary.gaps.len(), 1);
//! assert_eq!(summary.alerts.len(), 1);
//! # Ok::<(), spanwatch_core::AnalysisError>(())
//! ```
//!
//! Row and field problems never fail a run; they are counted in the summary's
//! diagnostics. Only configuration errors and total data loss return an
//! [`AnalysisError`].

pub mod alert;
pub mod config;
pub mod continuity;
mod error;
pub mod kpi;
pub mod normalize;
pub mod pipeline;
pub mod stats;
pub mod summary;
pub mod timestamp;

pub use alert::{AlertEvaluator, SpanInput};
pub use config::{AnalysisConfig, ColumnConfig};
pub use continuity::{ContinuityAnalyzer, ContinuityReport};
pub use error::{AnalysisError, Result};
pub use normalize::{ColumnPlan, NormalizedBatch, Normalizer, ParseFailure, ParseOutcome};
pub use pipeline::{Pipeline, SpanAnalysis};
pub use timestamp::{TimestampFormat, TimestampParser};
