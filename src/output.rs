// ==============================================================================
// output.rs - Summary Table Output
// ==============================================================================
// Description: In-memory summary table and its tab-separated writer
// Author: Mykrobe Summary Contributors
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while assembling or writing a table
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Row {index} has {actual} cells but the header has {expected}")]
    RowWidth {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to create output file {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV writer error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Header, data rows of the header's width, optional trailing legend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    legend: Option<Vec<String>>,
}

impl Table {
    pub fn new(header: Vec<String>) -> Self {
        Self {
            header,
            rows: Vec::new(),
            legend: None,
        }
    }

    /// Builder-style legend row (written after all data rows)
    pub fn with_legend(mut self, legend: &[&str]) -> Self {
        self.legend = Some(legend.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Append a data row; its width must match the header
    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), OutputError> {
        if row.len() != self.header.len() {
            return Err(OutputError::RowWidth {
                index: self.rows.len(),
                expected: self.header.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn legend(&self) -> Option<&[String]> {
        self.legend.as_deref()
    }
}

/// Tab-separated table writer
#[derive(Debug, Clone, Copy, Default)]
pub struct TsvWriter;

impl TsvWriter {
    /// Write `table` to any writer
    ///
    /// The legend row may differ in width from the header, so the underlying
    /// csv writer is flexible; data rows are already width-checked by `Table`.
    pub fn write_to<W: Write>(writer: W, table: &Table) -> Result<(), OutputError> {
        let mut tsv = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_writer(writer);

        tsv.write_record(table.header())?;
        for row in table.rows() {
            tsv.write_record(row)?;
        }
        if let Some(legend) = table.legend() {
            tsv.write_record(legend)?;
        }
        tsv.flush()?;
        Ok(())
    }

    /// Create (or truncate) `path` and write `table` to it
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - The written file
    /// * `Err(OutputError)` - The destination could not be opened or written
    pub fn write(path: impl AsRef<Path>, table: &Table) -> Result<PathBuf, OutputError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| OutputError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        Self::write_to(file, table)?;
        info!(
            "Wrote {} rows x {} columns to {:?}",
            table.rows().len(),
            table.header().len(),
            path
        );
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_push_row_rejects_wrong_width() {
        let mut table = Table::new(strings(&["file", "sample", "S_INH"]));
        assert!(table.push_row(strings(&["a.json", "a", "R"])).is_ok());

        let err = table.push_row(strings(&["b.json", "b"])).unwrap_err();
        match err {
            OutputError::RowWidth {
                index,
                expected,
                actual,
            } => {
                assert_eq!((index, expected, actual), (1, 3, 2));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(table.rows().len(), 1);
    }

    #[test]
    fn test_write_tsv_with_legend() {
        let mut table = Table::new(strings(&["file", "sample", "G_katG"]))
            .with_legend(&["Legend:", "", "", "G_: genes"]);
        table.push_row(strings(&["A.json", "sampleA", ""])).unwrap();
        table.push_row(strings(&["B.json", "sampleB", "95_40"])).unwrap();

        let mut buffer = Vec::new();
        TsvWriter::write_to(&mut buffer, &table).unwrap();
        let text = String::from_utf8(buffer).unwrap();

        assert_eq!(
            text,
            "file\tsample\tG_katG\n\
             A.json\tsampleA\t\n\
             B.json\tsampleB\t95_40\n\
             Legend:\t\t\tG_: genes\n"
        );
    }

    #[test]
    fn test_write_to_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.tsv");
        let table = Table::new(strings(&["file", "sample"]));

        let written = TsvWriter::write(&path, &table).unwrap();
        assert_eq!(written, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "file\tsample\n");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("summary.tsv");
        let table = Table::new(strings(&["file"]));
        assert!(matches!(
            TsvWriter::write(&path, &table),
            Err(OutputError::Create { .. })
        ));
    }
}
