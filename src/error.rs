//! Error types for the sales pipeline.
//!
//! Every failure aborts the run. Each variant maps to a process exit code:
//!
//! - `2`: bad input or configuration (missing file/column, unparseable value)
//! - `3`: no usable data left (empty table, empty column)
//! - `4`: computation failures (model fitting, data frame operations)

use polars::prelude::PolarsError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in '{path}': {source}")]
    Csv {
        path: String,
        #[source]
        source: PolarsError,
    },

    #[error("Missing required column `{column}` in table `{table}`")]
    MissingColumn { table: String, column: String },

    #[error("Invalid date '{value}' in column `{column}` (line {line}). Expected YYYY-MM-DD.")]
    InvalidDate { column: String, line: usize, value: String },

    #[error("Invalid number '{value}' in column `{column}` (line {line})")]
    InvalidNumber { column: String, line: usize, value: String },

    #[error("Unknown category '{value}' in column `{column}`")]
    UnknownCategory { column: String, value: String },

    #[error("Column `{column}` in table `{table}` has no observed values")]
    EmptyColumn { table: String, column: String },

    #[error("Duplicate join key {key} in column `{column}` of table `{table}`")]
    DuplicateKey { table: String, column: String, key: i64 },

    #[error("Column `{column}` exists in both `{left}` and `{right}`")]
    ColumnConflict { left: String, right: String, column: String },

    #[error("Column `{column}` has type {actual}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        actual: String,
    },

    #[error("Table `{0}` has too few rows to continue")]
    EmptyTable(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data frame error: {0}")]
    Polars(#[from] PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    pub fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn csv(path: impl AsRef<std::path::Path>, source: PolarsError) -> Self {
        AppError::Csv {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn missing_column(table: &str, column: &str) -> Self {
        AppError::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Io { .. }
            | AppError::Csv { .. }
            | AppError::MissingColumn { .. }
            | AppError::InvalidDate { .. }
            | AppError::InvalidNumber { .. }
            | AppError::UnknownCategory { .. }
            | AppError::DuplicateKey { .. }
            | AppError::ColumnConflict { .. }
            | AppError::TypeMismatch { .. }
            | AppError::Config(_) => 2,
            AppError::EmptyTable(_) | AppError::EmptyColumn { .. } => 3,
            AppError::Polars(_) | AppError::Model(_) | AppError::Json(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_table_and_column() {
        let err = AppError::missing_column("store", "Promo2");
        assert_eq!(
            err.to_string(),
            "Missing required column `Promo2` in table `store`"
        );
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_table_is_a_data_exit_code() {
        assert_eq!(AppError::EmptyTable("train".into()).exit_code(), 3);
        assert_eq!(AppError::Model("boom".into()).exit_code(), 4);
    }
}
