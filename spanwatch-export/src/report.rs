//! Writing rendered reports to an output directory.

use std::fs;
use std::path::{Path, PathBuf};

use spanwatch_types::Summary;

use crate::error::{ExportError, Result};

/// A report that can be written next to the others in an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    /// The full summary as pretty JSON (`summary.json`).
    Json,

    /// One row per KPI result (`kpis.csv`).
    KpiCsv,

    /// One row per alert (`alerts.csv`).
    AlertCsv,

    /// Prometheus exposition text (`prom_metrics.txt`).
    #[cfg(feature = "prometheus")]
    Prometheus {
        /// Optional metric name prefix.
        namespace: Option<String>,
    },
}

impl Report {
    /// The reports every run writes.
    pub fn standard() -> Vec<Report> {
        vec![Report::Json, Report::KpiCsv, Report::AlertCsv]
    }

    /// File name inside the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Report::Json => "summary.json",
            Report::KpiCsv => "kpis.csv",
            Report::AlertCsv => "alerts.csv",
            #[cfg(feature = "prometheus")]
            Report::Prometheus { .. } => "prom_metrics.txt",
        }
    }

    /// Render this report for a summary.
    pub fn render(&self, summary: &Summary) -> Result<String> {
        Ok(match self {
            Report::Json => crate::json::render_summary(summary)?,
            Report::KpiCsv => crate::csv::render_kpis(summary)?,
            Report::AlertCsv => crate::csv::render_alerts(summary)?,
            #[cfg(feature = "prometheus")]
            Report::Prometheus { namespace } => {
                crate::prometheus::render(summary, namespace.as_deref())
            }
        })
    }
}

/// Render each report and write it into `dir`, creating the directory if needed.
///
/// Existing files are overwritten. Returns the written paths in report order.
pub fn write_reports(summary: &Summary, dir: &Path, reports: &[Report]) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(reports.len());
    for report in reports {
        let path = dir.join(report.file_name());
        let body = report.render(summary)?;
        fs::write(&path, body).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "wrote report");
        written.push(path);
    }
    Ok(written)
}
