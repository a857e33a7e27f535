//! Z-score standardization with parameters fitted on one partition only.
//!
//! `fit` computes mean and population standard deviation per column on the
//! training rows; `transform` applies those same parameters to any table
//! (train, holdout, test). A constant column gets scale `1.0`.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::ScalerSummary;
use crate::error::{AppError, Result};
use crate::table::{Table, is_numeric_dtype};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleParams {
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardScaler {
    params: Vec<(String, ScaleParams)>,
}

impl StandardScaler {
    /// Fit on the given numeric columns of `table`.
    pub fn fit(table: &Table, columns: &[String]) -> Result<Self> {
        let mut params = Vec::with_capacity(columns.len());
        for column in columns {
            let values = float_series(table, column)?;
            let p = fit_column(&values)?.ok_or_else(|| AppError::EmptyColumn {
                table: table.name().to_string(),
                column: column.clone(),
            })?;
            debug!(column = %column, mean = p.mean, std = p.std, "scaler fitted");
            params.push((column.clone(), p));
        }
        Ok(Self { params })
    }

    /// Fit on every numeric column except those in `exclude` (e.g. the target).
    pub fn fit_excluding(table: &Table, exclude: &[&str]) -> Result<Self> {
        let columns: Vec<String> = table
            .numeric_columns()
            .into_iter()
            .filter(|c| !exclude.contains(&c.as_str()))
            .collect();
        Self::fit(table, &columns)
    }

    pub fn columns(&self) -> Vec<&str> {
        self.params.iter().map(|(c, _)| c.as_str()).collect()
    }

    pub fn params(&self, column: &str) -> Option<ScaleParams> {
        self.params.iter().find(|(c, _)| c == column).map(|(_, p)| *p)
    }

    /// Standardize the fitted columns of `table` in place.
    ///
    /// Every fitted column must be present. Missing values stay missing.
    pub fn transform(&self, table: &mut Table) -> Result<()> {
        for (column, p) in &self.params {
            let values = float_series(table, column)?;
            table.put(column, (&values - p.mean) / p.std)?;
        }
        Ok(())
    }

    pub fn inverse_transform(&self, table: &mut Table) -> Result<()> {
        for (column, p) in &self.params {
            let values = float_series(table, column)?;
            table.put(column, &values * p.std + p.mean)?;
        }
        Ok(())
    }

    pub fn summary(&self) -> Vec<ScalerSummary> {
        self.params
            .iter()
            .map(|(column, p)| ScalerSummary {
                column: column.clone(),
                mean: p.mean,
                std: p.std,
            })
            .collect()
    }
}

fn float_series(table: &Table, column: &str) -> Result<Series> {
    let series = table.series(column)?;
    if !is_numeric_dtype(series.dtype()) {
        return Err(AppError::TypeMismatch {
            column: column.to_string(),
            expected: "numeric".to_string(),
            actual: series.dtype().to_string(),
        });
    }
    Ok(series.cast(&DataType::Float64)?)
}

/// Mean and population standard deviation over observed values.
fn fit_column(values: &Series) -> Result<Option<ScaleParams>> {
    let ca = values.f64()?;
    let Some(mean) = ca.mean() else {
        return Ok(None);
    };
    let std = ca.std(0).unwrap_or(0.0);
    let std = if std.is_finite() && std > 0.0 { std } else { 1.0 };
    Ok(Some(ScaleParams { mean, std }))
}
