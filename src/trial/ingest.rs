// Trial ingestion module
// Locates per-subject circuit recordings and parses them into sample tables

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrialError {
    #[error("Failed to read trial CSV: {0}")]
    CsvReadError(#[from] csv::Error),

    #[error("Failed to open trial file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trial file has no header row")]
    MissingHeader,
}

/// One recorded trial: ordered channel headers plus one row per sample
///
/// Row order is the time axis. Cells that are empty or non-numeric
/// (sparse event-marker columns, mostly) are stored as `None`.
#[derive(Debug, Clone, Default)]
pub struct TrialTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl TrialTable {
    /// Build a table, padding or truncating rows to the header width
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<f64>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();

        TrialTable { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of sample rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Column index for an exact header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Numeric value at (row, column), `None` when missing or out of range
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied().flatten()
    }
}

/// Path of a processed circuit trial for one subject
/// e.g. `<data_dir>/AB156/Processed/AB156_Circuit_003_post.csv`
pub fn trial_path(data_dir: &Path, subject: &str, trial: u32) -> PathBuf {
    data_dir
        .join(format!("AB{}", subject))
        .join("Processed")
        .join(format!("AB{}_Circuit_{:03}_post.csv", subject, trial))
}

/// Load a trial table from a CSV file on disk
pub fn load_trial(path: &Path) -> Result<TrialTable, TrialError> {
    let file = File::open(path)?;
    parse_trial(file)
}

/// Parse a trial table from any CSV source
/// The first record is the header row
pub fn parse_trial<R: Read>(source: R) -> Result<TrialTable, TrialError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(TrialError::MissingHeader);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parse_cell).collect());
    }

    Ok(TrialTable::new(headers, rows))
}

/// Numeric cell, or `None` for empty / NaN / non-numeric content
fn parse_cell(cell: &str) -> Option<f64> {
    if cell.is_empty() {
        return None;
    }

    cell.parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Right_Shank_Ax,Right_Heel_Contact,Right_Heel_Contact_Trigger,Mode
0.5,3,101,1
0.6,,,1
0.7,NaN,,1
";

    #[test]
    fn test_parse_trial_headers_and_rows() {
        let table = parse_trial(SAMPLE.as_bytes()).unwrap();

        assert_eq!(table.num_columns(), 4);
        assert_eq!(table.len(), 3);
        assert_eq!(table.column("Mode"), Some(3));
        assert_eq!(table.column("Missing"), None);
    }

    #[test]
    fn test_sparse_cells_are_missing() {
        let table = parse_trial(SAMPLE.as_bytes()).unwrap();
        let marker = table.column("Right_Heel_Contact").unwrap();

        assert_eq!(table.value(0, marker), Some(3.0));
        assert_eq!(table.value(1, marker), None);
        // NaN counts as missing
        assert_eq!(table.value(2, marker), None);
        // Out of range
        assert_eq!(table.value(10, marker), None);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let csv_data = "A,B,C\n1,2\n";
        let table = parse_trial(csv_data.as_bytes()).unwrap();

        assert_eq!(table.value(0, 0), Some(1.0));
        assert_eq!(table.value(0, 2), None);
    }

    #[test]
    fn test_trial_path_pattern() {
        let path = trial_path(Path::new("/data"), "156", 3);
        assert_eq!(
            path,
            PathBuf::from("/data/AB156/Processed/AB156_Circuit_003_post.csv")
        );
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = load_trial(Path::new("/definitely/not/here.csv"));
        assert!(matches!(result, Err(TrialError::Io(_))));
    }
}
