//! Ordinary least-squares baseline.

use nalgebra::{DMatrix, DVector};

use crate::error::{AppError, Result};
use crate::math::{solve_least_squares, with_intercept};

#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    /// Intercept first, then one coefficient per feature.
    coef: Option<DVector<f64>>,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        if x.nrows() == 0 || x.nrows() != y.len() {
            return Err(AppError::Model(format!(
                "least squares needs matching non-empty inputs (rows {}, targets {})",
                x.nrows(),
                y.len()
            )));
        }
        let beta = solve_least_squares(&with_intercept(x), y)
            .ok_or_else(|| AppError::Model("least squares system could not be solved".to_string()))?;
        self.coef = Some(beta);
        Ok(())
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let beta = self
            .coef
            .as_ref()
            .ok_or_else(|| AppError::Model("linear model is not fitted".to_string()))?;
        if x.ncols() + 1 != beta.len() {
            return Err(AppError::Model(format!(
                "linear model expects {} features, got {}",
                beta.len() - 1,
                x.ncols()
            )));
        }
        Ok(with_intercept(x) * beta)
    }

    pub fn coefficients(&self) -> Option<&DVector<f64>> {
        self.coef.as_ref()
    }
}
