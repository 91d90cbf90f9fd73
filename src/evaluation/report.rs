// Accuracy report file
// Three lines of per-fold accuracies: total, steadystate, transitional

use std::path::Path;

use crate::evaluation::metrics::{EvaluationReport, SubsetAccuracy};
use crate::state::storage::{store_file, StorageError};

fn format_line(name: &str, values: &[SubsetAccuracy]) -> String {
    let mut line = name.to_string();
    for value in values {
        line.push(' ');
        line.push_str(&value.to_string());
    }
    line
}

/// Report text, one line per series; undefined folds are written as `undefined`
pub fn format_report(report: &EvaluationReport) -> String {
    [
        format_line("total", &report.overall()),
        format_line("steadystate", &report.steady_state()),
        format_line("transitional", &report.transitional()),
    ]
    .join("\n")
        + "\n"
}

/// Write the report, creating parent directories
pub fn write_report(report: &EvaluationReport, path: &Path) -> Result<(), StorageError> {
    store_file(path, format_report(report).as_bytes())?;
    log::info!("Wrote accuracy report to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::{FoldResult, FoldScores};
    use tempfile::TempDir;

    fn report() -> EvaluationReport {
        let fold = |fold, overall, steady, transitional| FoldResult {
            fold,
            train_size: 8,
            test_size: 2,
            scores: FoldScores {
                overall,
                steady_state: steady,
                transitional,
            },
        };

        EvaluationReport {
            folds: vec![
                fold(
                    0,
                    SubsetAccuracy::Defined { correct: 1, total: 2 },
                    SubsetAccuracy::Defined { correct: 1, total: 1 },
                    SubsetAccuracy::Defined { correct: 0, total: 1 },
                ),
                fold(
                    1,
                    SubsetAccuracy::Defined { correct: 2, total: 2 },
                    SubsetAccuracy::Defined { correct: 2, total: 2 },
                    SubsetAccuracy::Undefined,
                ),
            ],
        }
    }

    #[test]
    fn test_format_report() {
        assert_eq!(
            format_report(&report()),
            "total 0.5 1\nsteadystate 1 1\ntransitional 0 undefined\n"
        );
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results").join("LDA").join("x_accuracy.txt");

        write_report(&report(), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("total "));
    }
}
