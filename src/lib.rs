//! # spanwatch
//!
//! Batch analyzer for optical span performance-monitoring telemetry.
//!
//! This crate is the command-line front end. It reads vendor PM exports,
//! runs them through the [`spanwatch_core`] pipeline and writes reports with
//! [`spanwatch_export`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           spanwatch                              │
//! │  ┌──────────┐    ┌────────────────────────────┐    ┌──────────┐ │
//! │  │  source  │───▶│       spanwatch-core       │───▶│  export  │ │
//! │  │  (CSV)   │    │ normalize ▸ continuity ▸   │    │ json/csv │ │
//! │  └──────────┘    │ kpi ▸ alert ▸ summary      │    │ prom     │ │
//! │       ▲          └────────────────────────────┘    └──────────┘ │
//! │       │                        ▲                                 │
//! │  ┌──────────┐                  │                                 │
//! │  │  --input │          ┌──────────────┐                          │
//! │  └──────────┘          │   settings   │◀── file ▸ env ▸ flags    │
//! │                        └──────────────┘                          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: the [`RowSource`] trait with CSV and in-memory implementations
//! - **[`settings`]**: layered [`AnalysisConfig`](spanwatch_core::AnalysisConfig) loading
//!
//! ## Usage
//!
//! ```bash
//! # Analyze every CSV in a directory, writing reports to ./output
//! spanwatch --input ./pm-exports
//!
//! # Use a config file and also write Prometheus text
//! spanwatch --input day1.csv day2.csv --config spanwatch.toml --prometheus
//!
//! # Check a config file without reading any data
//! spanwatch --config spanwatch.toml check-config
//! ```
//!
//! ### As a library
//!
//! ```
//! use spanwatch::{MemorySource, RowSource};
//! use spanwatch_core::{AnalysisConfig, Pipeline};
//! use spanwatch_types::RawBatch;
//!
//! let batch = RawBatch::builder()
//!     .row([("Time", "2024-01-01 00:00:00"), ("TP", "OCH-1"), ("OSNR", "20.1")])
//!     .row([("Time", "2024-01-01 00:15:00"), ("TP", "OCH-1"), ("OSNR", "19.8")])
//!     .build();
//! let mut source = MemorySource::new(batch, "inline");
//!
//! let pipeline = Pipeline::new(AnalysisConfig::default()).unwrap();
//! let summary = pipeline.run(&source.read().unwrap()).unwrap();
//! assert_eq!(summary.span_count, 1);
//! ```

pub mod settings;
pub mod source;

pub use settings::{load as load_settings, Overrides};
pub use source::{find_csv_files, CsvSource, MemorySource, RowSource, SourceError};
