//! # spanwatch-types
//!
//! Core types for optical span telemetry analysis. This crate defines the
//! schema shared by the analysis pipeline and every exporter: raw input rows,
//! normalized records, sampling profiles, gaps, KPI results, alert rules and
//! the run-level [`Summary`].
//!
//! ## Features
//!
//! - `serde`: JSON/TOML/etc. serialization via serde (also enables chrono's
//!   serde support for timestamps)
//!
//! ## Example
//!
//! ```rust
//! use spanwatch_types::{AlertRule, Comparator, RawBatch, Severity};
//!
//! let batch = RawBatch::builder()
//!     .row([("TP", "span-1"), ("Time", "2024-01-01 00:00:00"), ("OSNR", "20.1")])
//!     .row([("TP", "span-1"), ("Time", "2024-01-01 00:15:00"), ("OSNR", "NS")])
//!     .build();
//!
//! let rule = AlertRule::new("osnr", Comparator::Lt, 15.0, Severity::Warning);
//!
//! assert_eq!(batch.len(), 2);
//! assert!(rule.comparator.breaches(14.2, rule.threshold));
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. It is embedded in every serialized
//! summary so dashboards can handle format evolution.

mod alert;
mod continuity;
mod interval;
mod kpi;
mod raw;
mod record;
mod summary;
mod version;

pub use alert::*;
pub use continuity::*;
pub use interval::*;
pub use kpi::*;
pub use raw::*;
pub use record::*;
pub use summary::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the summary format.
pub const SCHEMA_VERSION: u32 = 1;
