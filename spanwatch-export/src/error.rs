//! Error types for exporters.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when rendering or writing reports.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Serializing the summary failed.
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),

    /// Encoding a CSV table failed.
    #[error("Failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Writing a report file failed.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ExportError> = std::result::Result<T, E>;
