//! CSV exports: joined intermediate tables and per-model submissions.
//!
//! Missing values are written as empty cells.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{AppError, Result};
use crate::table::Table;

/// Header of the single prediction column in a submission file.
pub const PREDICTION_COLUMN: &str = "Predicted Sales";

fn write_frame(path: &Path, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path).map_err(|e| AppError::io(path, e))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .map_err(|e| AppError::csv(path, e))
}

/// Write a whole table (header + rows, no index column).
pub fn write_table_csv(path: &Path, table: &Table) -> Result<()> {
    let mut df = table.df().clone();
    write_frame(path, &mut df)?;
    info!(table = table.name(), rows = table.height(), "wrote {}", path.display());
    Ok(())
}

/// Write model predictions keyed by row position.
pub fn write_predictions_csv(path: &Path, predictions: &[f64]) -> Result<()> {
    let index: Vec<i64> = (0..predictions.len() as i64).collect();
    let mut df = df!(
        "index" => index,
        PREDICTION_COLUMN => predictions,
    )?;
    write_frame(path, &mut df)?;
    info!(rows = predictions.len(), "wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_writes_missing_as_empty_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let table = Table::from_series(
            "t",
            vec![
                Series::new("Store".into(), &[Some(1i64), Some(2)]),
                Series::new("CompetitionDistance".into(), &[None, Some(2.5)]),
            ],
        )
        .unwrap();

        write_table_csv(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Store,CompetitionDistance\n1,\n2,2.5\n");
    }

    #[test]
    fn predictions_have_index_and_single_value_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.csv");
        write_predictions_csv(&path, &[10.5, 20.0]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "index,Predicted Sales");
        assert_eq!(lines[1], "0,10.5");
        let (idx, value) = lines[2].split_once(',').unwrap();
        assert_eq!(idx, "1");
        assert_eq!(value.parse::<f64>().unwrap(), 20.0);
    }

    #[test]
    fn unwritable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("p.csv");
        let err = write_predictions_csv(&path, &[1.0]).unwrap_err();
        assert!(matches!(err, AppError::Io { .. }));
    }
}
