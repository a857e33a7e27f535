//! Flag-conditioned scale reversal for store attributes.
//!
//! Promotion window: rows whose flag is unset get the sentinel `0`; rows whose
//! flag is set get `column_max - value`, so that "more recent" maps to a larger
//! number. Must run before mean imputation, otherwise the sentinel rows would
//! drag the imputed mean towards zero.

use polars::prelude::*;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::table::{Table, is_integer_dtype};

/// Label written into reset categorical columns for flag-unset rows.
pub const SENTINEL_LABEL: &str = "0";

/// Apply the promotion-window transform.
///
/// - `flag`: integer flag column (`0` = unset, anything else = set)
/// - `columns`: numeric columns to transform
/// - `reset_labels`: categorical columns set to `SENTINEL_LABEL` where the flag is unset
///
/// Rows with a missing flag are left untouched.
pub fn apply_promo_window(
    table: &mut Table,
    flag: &str,
    columns: &[&str],
    reset_labels: &[&str],
) -> Result<()> {
    let flags = table.f64_values(flag)?;

    for &column in columns {
        let values = table.f64_values(column)?;
        let Some(max) = column_max(&values) else {
            debug!(table = table.name(), column, "no observed values, promo window skipped");
            continue;
        };

        let transformed: Vec<Option<f64>> = flags
            .iter()
            .zip(&values)
            .map(|(f, v)| match f {
                Some(f) if *f == 0.0 => Some(0.0),
                Some(_) => v.map(|v| max - v),
                None => *v,
            })
            .collect();

        let keep_integer = is_integer_dtype(&table.dtype(column)?);
        table.put(column, to_series(column, transformed, keep_integer))?;
        debug!(table = table.name(), column, max, "promo window applied");
    }

    for &column in reset_labels {
        let dtype = table.dtype(column)?;
        if dtype != DataType::String {
            return Err(AppError::TypeMismatch {
                column: column.to_string(),
                expected: "categorical".to_string(),
                actual: dtype.to_string(),
            });
        }
        let reset: StringChunked = table
            .series(column)?
            .str()?
            .into_iter()
            .zip(&flags)
            .map(|(label, f)| if *f == Some(0.0) { Some(SENTINEL_LABEL) } else { label })
            .collect();
        table.put(column, reset.into_series())?;
    }

    Ok(())
}

/// Replace every value with `column_max - value`.
///
/// Returns the maximum used, or `None` if the column has no observed values.
pub fn reverse_scale(table: &mut Table, column: &str) -> Result<Option<f64>> {
    let values = table.f64_values(column)?;
    let Some(max) = column_max(&values) else {
        return Ok(None);
    };
    reverse_scale_with_max(table, column, max)?;
    Ok(Some(max))
}

/// Replace every value with `max - value` for an externally supplied `max`.
///
/// Used to apply a maximum fitted on one table to another.
pub fn reverse_scale_with_max(table: &mut Table, column: &str, max: f64) -> Result<()> {
    let values = table.f64_values(column)?;
    let keep_integer = is_integer_dtype(&table.dtype(column)?) && max.fract() == 0.0;
    let reversed = values.into_iter().map(|v| v.map(|v| max - v)).collect();
    table.put(column, to_series(column, reversed, keep_integer))
}

pub fn column_max(values: &[Option<f64>]) -> Option<f64> {
    values.iter().flatten().copied().reduce(f64::max)
}

fn to_series(name: &str, values: Vec<Option<f64>>, integer: bool) -> Series {
    if integer {
        let ints: Vec<Option<i64>> = values.into_iter().map(|v| v.map(|v| v as i64)).collect();
        Series::new(name.into(), ints)
    } else {
        Series::new(name.into(), values)
    }
}
