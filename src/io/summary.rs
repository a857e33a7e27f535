//! Read/write the JSON run summary.
//!
//! The summary records what the pipeline decided (row counts, category codes,
//! scaler parameters, holdout scores) without any of the data itself. The
//! schema is defined by `domain::RunSummary`.

use std::fs::File;
use std::path::Path;

use crate::domain::RunSummary;
use crate::error::{AppError, Result};

pub fn write_run_summary_json(path: &Path, summary: &RunSummary) -> Result<()> {
    let file = File::create(path).map_err(|e| AppError::io(path, e))?;
    serde_json::to_writer_pretty(file, summary)?;
    Ok(())
}

pub fn read_run_summary_json(path: &Path) -> Result<RunSummary> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    let summary: RunSummary = serde_json::from_reader(file)?;
    Ok(summary)
}
