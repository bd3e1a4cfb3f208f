//! Delimited patient table reader.
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::error::{ReadmitError, Result};

/// In-memory table of string cells with a header row.
///
/// Cells are kept as trimmed text; numeric parsing is deferred to
/// preprocessing so that identifier columns can be dropped before any
/// number is read.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, checking that every row has one cell per header.
    pub fn from_rows<H, R, C>(headers: H, rows: R) -> Result<Self>
    where
        H: IntoIterator,
        H::Item: Into<String>,
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut out = Vec::new();
        for (row_idx, row) in rows.into_iter().enumerate() {
            let row: Vec<String> = row
                .into_iter()
                .map(|c| {
                    let cell: String = c.into();
                    cell.trim().to_string()
                })
                .collect();
            if row.len() != headers.len() {
                return Err(ReadmitError::DataValidation(format!(
                    "row {} has {} cells but the header has {} columns",
                    row_idx + 1,
                    row.len(),
                    headers.len()
                )));
            }
            out.push(row);
        }
        Ok(Self { headers, rows: out })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row[idx].as_str()).collect())
    }
}

/// Read a CSV (or TSV, by extension) file with a header row into a [`Table`].
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let is_tsv = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("tsv"))
        .unwrap_or(false);
    let delimiter = if is_tsv { b'\t' } else { b',' };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_path(path)
        .map_err(|e| {
            ReadmitError::DataValidation(format!("failed to open {}: {}", path.display(), e))
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReadmitError::DataValidation(format!("failed to read header row: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReadmitError::DataValidation(format!(
            "{} has no header row",
            path.display()
        )));
    }

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record: StringRecord = result.map_err(|e| {
            ReadmitError::DataValidation(format!("failed to read row {}: {}", row_idx + 1, e))
        })?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    log::debug!(
        "Read {} rows x {} columns from {}",
        rows.len(),
        headers.len(),
        path.display()
    );

    Table::from_rows(headers, rows)
}

/// Check that `path` names an existing `.csv` or `.tsv` file.
pub fn validate_tsv_or_csv_file(path: &str) -> anyhow::Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    match ext.as_deref() {
        Some("tsv") | Some("csv") => {}
        _ => anyhow::bail!("File must have a .tsv or .csv extension: {}", path),
    }

    if !pb.exists() {
        anyhow::bail!("File does not exist: {}", path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::from_rows(["a", "b"], vec![vec!["1", "2"], vec!["3"]]).unwrap_err();
        assert!(matches!(err, ReadmitError::DataValidation(_)));
    }
}
