//! Missing-value handling.
//!
//! Two policies coexist:
//! - flag columns get a configured domain constant (`fill_flag_default`)
//! - other numeric columns get their own mean over observed values
//!   (`impute_mean`), computed per table and per column

use polars::prelude::*;
use tracing::{debug, info};

use crate::domain::ImputationRecord;
use crate::error::{AppError, Result};
use crate::table::{Table, is_integer_dtype, is_numeric_dtype};

/// Missing-value counts for one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingProfile {
    pub table: String,
    pub rows: usize,
    /// `(column, missing)` ordered by count descending, then column order.
    pub counts: Vec<(String, usize)>,
}

impl MissingProfile {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    pub fn missing_in(&self, column: &str) -> Option<usize> {
        self.counts.iter().find(|(c, _)| c == column).map(|(_, n)| *n)
    }
}

pub fn profile_missing(table: &Table) -> MissingProfile {
    let mut counts: Vec<(String, usize)> = table
        .df()
        .get_columns()
        .iter()
        .map(|col| (col.name().to_string(), col.null_count()))
        .collect();
    // Stable sort keeps column order among ties.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    MissingProfile {
        table: table.name().to_string(),
        rows: table.height(),
        counts,
    }
}

/// Fill missing values of a flag column with `value`. Returns the fill count.
pub fn fill_flag_default(table: &mut Table, column: &str, value: i64) -> Result<usize> {
    let series = table.series(column)?;
    let dtype = series.dtype().clone();
    let filled = series.null_count();
    if filled == 0 {
        return Ok(0);
    }
    let series = if is_integer_dtype(&dtype) {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .fill_null_with_values(value)?
            .into_series()
    } else if is_numeric_dtype(&dtype) {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .fill_null_with_values(value as f64)?
            .into_series()
    } else {
        return Err(AppError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".to_string(),
            actual: dtype.to_string(),
        });
    };
    table.put(column, series)?;
    info!(table = table.name(), column, filled, value, "filled flag default");
    Ok(filled)
}

/// Replace missing values of a numeric column with its observed mean.
///
/// Returns the record of what was filled, or `None` if nothing was missing.
/// An integer column stays integer when the mean is whole, else it becomes
/// a float column.
pub fn impute_mean(table: &mut Table, column: &str) -> Result<Option<ImputationRecord>> {
    let series = table.series(column)?;
    let dtype = series.dtype().clone();
    if !is_numeric_dtype(&dtype) {
        return Err(AppError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".to_string(),
            actual: dtype.to_string(),
        });
    }
    let missing = series.null_count();
    if missing == 0 {
        return Ok(None);
    }

    let floats = series.cast(&DataType::Float64)?;
    let mean = floats.f64()?.mean().ok_or_else(|| AppError::EmptyColumn {
        table: table.name().to_string(),
        column: column.to_string(),
    })?;

    let filled = if is_integer_dtype(&dtype) && mean.fract() == 0.0 {
        series
            .cast(&DataType::Int64)?
            .i64()?
            .fill_null_with_values(mean as i64)?
            .into_series()
    } else {
        floats.f64()?.fill_null_with_values(mean)?.into_series()
    };
    table.put(column, filled)?;

    debug!(table = table.name(), column, missing, mean, "mean imputed");
    Ok(Some(ImputationRecord {
        table: table.name().to_string(),
        column: column.to_string(),
        filled: missing,
        mean,
    }))
}

/// Mean-impute every numeric column that has missing values.
pub fn impute_numeric_means(table: &mut Table) -> Result<Vec<ImputationRecord>> {
    let mut records = Vec::new();
    for column in table.numeric_columns() {
        if let Some(record) = impute_mean(table, &column)? {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: Vec<Series>) -> Table {
        Table::from_series("t", columns).unwrap()
    }

    #[test]
    fn mean_of_one_missing_three_is_two() {
        let mut t = table(vec![Series::new("x".into(), &[Some(1i64), None, Some(3)])]);
        let record = impute_mean(&mut t, "x").unwrap().unwrap();
        assert_eq!(record.mean, 2.0);
        assert_eq!(record.filled, 1);
        assert_eq!(t.dtype("x").unwrap(), DataType::Int64);
        assert_eq!(t.i64_values("x").unwrap(), vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn fractional_mean_turns_integer_column_into_floats() {
        let mut t = table(vec![Series::new("x".into(), &[Some(1i64), None, Some(2)])]);
        impute_mean(&mut t, "x").unwrap();
        assert_eq!(t.dtype("x").unwrap(), DataType::Float64);
        assert_eq!(t.f64_values("x").unwrap(), vec![Some(1.0), Some(1.5), Some(2.0)]);
    }

    #[test]
    fn complete_column_is_left_alone() {
        let mut t = table(vec![Series::new("x".into(), &[Some(1i64), Some(2)])]);
        let before = t.clone();
        assert!(impute_mean(&mut t, "x").unwrap().is_none());
        assert_eq!(t, before);
    }

    #[test]
    fn all_missing_column_is_an_error() {
        let mut t = table(vec![Series::new("x".into(), &[None::<f64>, None])]);
        let err = impute_mean(&mut t, "x").unwrap_err();
        assert!(matches!(err, AppError::EmptyColumn { .. }));
    }

    #[test]
    fn string_column_cannot_be_mean_imputed() {
        let mut t = table(vec![Series::new("x".into(), &[Some("a"), None])]);
        let err = impute_mean(&mut t, "x").unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { .. }));
    }

    #[test]
    fn columns_are_imputed_independently() {
        let mut t = table(vec![
            Series::new("a".into(), &[Some(10.0), None, Some(20.0)]),
            Series::new("b".into(), &[None, Some(1.0), Some(2.0)]),
        ]);
        let records = impute_numeric_means(&mut t).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(t.f64_values("a").unwrap()[1], Some(15.0));
        assert_eq!(t.f64_values("b").unwrap()[0], Some(1.5));
        assert!(profile_missing(&t).is_clean());
    }

    #[test]
    fn flag_default_fills_only_missing_rows() {
        let mut t = table(vec![Series::new("Open".into(), &[Some(0i64), None, Some(1), None])]);
        let filled = fill_flag_default(&mut t, "Open", 1).unwrap();
        assert_eq!(filled, 2);
        assert_eq!(
            t.i64_values("Open").unwrap(),
            vec![Some(0), Some(1), Some(1), Some(1)]
        );
    }

    #[test]
    fn profile_orders_by_missing_count() {
        let t = table(vec![
            Series::new("a".into(), &[Some(1i64), None]),
            Series::new("b".into(), &[None::<i64>, None]),
            Series::new("c".into(), &[Some(1i64), Some(2)]),
        ]);
        let profile = profile_missing(&t);
        let names: Vec<&str> = profile.counts.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(profile.total(), 3);
        assert_eq!(profile.missing_in("a"), Some(1));
    }
}
