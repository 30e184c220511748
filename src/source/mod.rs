//! Row source abstraction for loading raw telemetry.
//!
//! A source turns some external input into a [`RawBatch`] without
//! interpreting any cell. Typing, null handling and timestamp parsing all
//! happen later in the normalizer.

mod csv;
mod memory;

pub use self::csv::{find_csv_files, CsvSource};
pub use memory::MemorySource;

use std::fmt::Debug;
use std::path::PathBuf;

use spanwatch_types::RawBatch;
use thiserror::Error;

/// Errors raised while reading input rows.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The input path could not be opened or listed.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not readable as CSV.
    #[error("Malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: ::csv::Error,
    },
}

/// Trait for loading raw rows from various inputs.
///
/// # Example
///
/// ```no_run
/// use spanwatch::{CsvSource, RowSource};
///
/// let mut source = CsvSource::open(&["telemetry/".into()])?;
/// let batch = source.read()?;
/// println!("{} rows from {}", batch.len(), source.description());
/// # Ok::<(), spanwatch::SourceError>(())
/// ```
pub trait RowSource: Send + Debug {
    /// Read every row the source holds.
    fn read(&mut self) -> Result<RawBatch, SourceError>;

    /// Returns a human-readable description of the source, used in logs.
    fn description(&self) -> &str;
}
