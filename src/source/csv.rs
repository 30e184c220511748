//! CSV file source.
//!
//! Reads one or more header-first CSV files into a single batch. Headers are
//! trimmed and registered in file order; cells are kept as text.

use std::fs;
use std::path::{Path, PathBuf};

use spanwatch_types::{RawBatch, RawRow, RawValue};

use super::{RowSource, SourceError};

/// A source reading every row of a list of CSV files, in order.
#[derive(Debug)]
pub struct CsvSource {
    paths: Vec<PathBuf>,
    description: String,
}

impl CsvSource {
    /// Create a source over explicit file paths.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        let description = match paths.as_slice() {
            [one] => format!("csv: {}", one.display()),
            many => format!("csv: {} files", many.len()),
        };
        Self { paths, description }
    }

    /// Create a source from inputs that may be files or directories.
    ///
    /// Directories contribute their `*.csv` files (see [`find_csv_files`]).
    pub fn open(inputs: &[PathBuf]) -> Result<Self, SourceError> {
        let mut paths = Vec::new();
        for input in inputs {
            if input.is_dir() {
                let found = find_csv_files(input)?;
                if found.is_empty() {
                    tracing::warn!(dir = %input.display(), "no CSV files in directory");
                }
                paths.extend(found);
            } else {
                paths.push(input.clone());
            }
        }
        Ok(Self::new(paths))
    }

    /// Returns the files this source reads.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn read_file(path: &Path, batch: &mut RawBatch) -> Result<usize, SourceError> {
        let csv_err = |source| SourceError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let file = fs::File::open(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = ::csv::ReaderBuilder::new()
            .flexible(true)
            .trim(::csv::Trim::Headers)
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .map(|h| h.to_string())
            .collect();
        for name in headers.iter().filter(|h| !h.is_empty()) {
            if !batch.columns.contains(name) {
                batch.columns.push(name.clone());
            }
        }

        let mut rows = 0;
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            let row: RawRow = headers
                .iter()
                .enumerate()
                .filter(|(_, name)| !name.is_empty())
                .map(|(i, name)| {
                    let cell = record.get(i).map_or(RawValue::Empty, RawValue::text);
                    (name.clone(), cell)
                })
                .collect();
            batch.push(row);
            rows += 1;
        }
        Ok(rows)
    }
}

impl RowSource for CsvSource {
    fn read(&mut self) -> Result<RawBatch, SourceError> {
        let mut batch = RawBatch::new();
        for path in &self.paths {
            let rows = Self::read_file(path, &mut batch)?;
            tracing::info!(path = %path.display(), rows, "loaded CSV file");
        }
        Ok(batch)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// List the `*.csv` files directly inside `dir`, sorted by path.
///
/// The extension match is case-insensitive and subdirectories are not entered.
pub fn find_csv_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let io_err = |source| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if is_csv && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn sample_csv() -> &'static str {
        "Time, TP ,NE,ESNR-AVG\n\
         2024-01-01 00:00:00,OCH-1,ne1,20.5\n\
         2024-01-01 00:15:00,OCH-1,ne1,NS\n\
         2024-01-01 00:30:00,OCH-1,ne1,\n"
    }

    #[test]
    fn test_csv_source_new() {
        let source = CsvSource::new(vec!["/tmp/a.csv".into()]);
        assert_eq!(source.description(), "csv: /tmp/a.csv");

        let source = CsvSource::new(vec!["a.csv".into(), "b.csv".into()]);
        assert_eq!(source.description(), "csv: 2 files");
    }

    #[test]
    fn test_read_trims_headers_and_keeps_text() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", sample_csv()).unwrap();

        let mut source = CsvSource::new(vec![file.path().to_path_buf()]);
        let batch = source.read().unwrap();

        assert_eq!(batch.columns, vec!["Time", "TP", "NE", "ESNR-AVG"]);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.rows[0]["TP"], RawValue::Text("OCH-1".to_string()));
        assert_eq!(batch.rows[0]["ESNR-AVG"], RawValue::Text("20.5".to_string()));
        assert_eq!(batch.rows[1]["ESNR-AVG"], RawValue::Text("NS".to_string()));
        assert_eq!(batch.rows[2]["ESNR-AVG"], RawValue::Empty);
    }

    #[test]
    fn test_short_rows_get_empty_cells() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "Time,TP,ESNR-AVG\n2024-01-01 00:00:00,OCH-1\n").unwrap();

        let batch = CsvSource::new(vec![file.path().to_path_buf()]).read().unwrap();

        assert_eq!(batch.rows[0]["ESNR-AVG"], RawValue::Empty);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut source = CsvSource::new(vec!["/nonexistent/path/pm.csv".into()]);

        let err = source.read().unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/path/pm.csv"));
    }

    #[test]
    fn test_find_csv_files_sorted_non_recursive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.csv"), "Time\n").unwrap();
        fs::write(dir.path().join("a.CSV"), "Time\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested").join("c.csv"), "Time\n").unwrap();

        let files = find_csv_files(dir.path()).unwrap();

        assert_eq!(files, vec![dir.path().join("a.CSV"), dir.path().join("b.csv")]);
    }

    #[test]
    fn test_open_merges_files_and_dirs() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("one.csv"),
            "Time,TP,OSNR\n2024-01-01 00:00:00,OCH-1,20\n",
        )
        .unwrap();
        let mut extra = NamedTempFile::new().unwrap();
        write!(extra, "Time,TP,CDR\n2024-01-01 00:00:00,OCH-2,120\n").unwrap();

        let mut source =
            CsvSource::open(&[dir.path().to_path_buf(), extra.path().to_path_buf()]).unwrap();
        let batch = source.read().unwrap();

        assert_eq!(source.paths().len(), 2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.columns, vec!["Time", "TP", "OSNR", "CDR"]);
    }
}
