//! # spanwatch-export
//!
//! Renderers for spanwatch summaries.
//!
//! Every renderer takes a finished [`Summary`](spanwatch_types::Summary) and
//! produces text; nothing here recomputes analysis results.
//!
//! - [`json`]: the whole summary as pretty JSON
//! - [`csv`]: KPI and alert tables
//! - [`prometheus`]: gauge exposition text (feature `prometheus`, on by default)
//! - [`write_reports`]: render a set of [`Report`]s into an output directory
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use spanwatch_export::{write_reports, Report};
//! # fn run(summary: &spanwatch_types::Summary) -> spanwatch_export::Result<()> {
//! let written = write_reports(summary, Path::new("output"), &Report::standard())?;
//! for path in written {
//!     println!("wrote {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod report;

pub mod csv;
pub mod json;

#[cfg(feature = "prometheus")]
pub mod prometheus;

#[cfg(test)]
mod fixtures;

pub use error::{ExportError, Result};
pub use report::{write_reports, Report};
