//! In-memory row source.
//!
//! Hands out a batch that was assembled elsewhere, for embedding the
//! analyzer behind another ingestion path or in tests.

use spanwatch_types::RawBatch;

use super::{RowSource, SourceError};

/// A source that yields a prepared batch once.
///
/// Subsequent reads return an empty batch.
///
/// # Example
///
/// ```
/// use spanwatch::{MemorySource, RowSource};
/// use spanwatch_types::RawBatch;
///
/// let batch = RawBatch::builder()
///     .row([("Time", "2024-01-01 00:00:00"), ("TP", "OCH-1"), ("OSNR", "20.1")])
///     .build();
/// let mut source = MemorySource::new(batch, "inline");
/// assert_eq!(source.read().unwrap().len(), 1);
/// assert!(source.read().unwrap().is_empty());
/// ```
#[derive(Debug)]
pub struct MemorySource {
    batch: Option<RawBatch>,
    description: String,
}

impl MemorySource {
    /// Create a new memory source.
    pub fn new(batch: RawBatch, source_description: &str) -> Self {
        Self {
            batch: Some(batch),
            description: format!("memory: {}", source_description),
        }
    }
}

impl RowSource for MemorySource {
    fn read(&mut self) -> Result<RawBatch, SourceError> {
        Ok(self.batch.take().unwrap_or_default())
    }

    fn description(&self) -> &str {
        &self.description
    }
}
