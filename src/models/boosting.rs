//! Least-squares gradient boosting over shallow regression trees.

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::debug;

use crate::domain::{BoostingParams, TreeParams};
use crate::error::{AppError, Result};
use crate::models::tree::DecisionTreeRegressor;

#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    params: BoostingParams,
    seed: u64,
    init: Option<f64>,
    trees: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    pub fn new(params: BoostingParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            init: None,
            trees: Vec::new(),
        }
    }

    /// Start from the target mean, then fit each tree to the current residuals.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 || n != y.len() {
            return Err(AppError::Model(format!(
                "boosting needs matching non-empty inputs (rows {n}, targets {})",
                y.len()
            )));
        }
        let lr = self.params.learning_rate;
        if !lr.is_finite() || lr <= 0.0 {
            return Err(AppError::Model("learning rate must be positive".to_string()));
        }

        let init = y.mean();
        let mut pred = DVector::from_element(n, init);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let tree_params = TreeParams {
            max_depth: Some(self.params.max_depth),
            ..TreeParams::default()
        };

        self.trees.clear();
        for round in 0..self.params.n_estimators {
            let residuals = y - &pred;
            let rows = self.subsample(n, &mut rng);
            let mut tree = DecisionTreeRegressor::new(tree_params);
            tree.fit_rows(x, &residuals, &rows)?;
            pred += tree.predict(x)? * self.params.learning_rate;
            self.trees.push(tree);

            if round % 25 == 0 {
                let mse = (y - &pred).norm_squared() / n as f64;
                debug!(round, mse, "boosting progress");
            }
        }
        self.init = Some(init);
        Ok(())
    }

    fn subsample(&self, n: usize, rng: &mut StdRng) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..n).collect();
        if self.params.subsample < 1.0 {
            rows.shuffle(rng);
            let keep = ((n as f64 * self.params.subsample).ceil() as usize).clamp(1, n);
            rows.truncate(keep);
        }
        rows
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let init = self
            .init
            .ok_or_else(|| AppError::Model("gradient boosting is not fitted".to_string()))?;
        let mut pred = DVector::from_element(x.nrows(), init);
        for tree in &self.trees {
            pred += tree.predict(x)? * self.params.learning_rate;
        }
        Ok(pred)
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quadratic() -> (DMatrix<f64>, DVector<f64>) {
        let n = 40;
        let x = DMatrix::from_fn(n, 1, |i, _| i as f64 / 4.0);
        let y = DVector::from_fn(n, |i, _| (i as f64 / 4.0).powi(2));
        (x, y)
    }

    #[test]
    fn zero_rounds_predict_the_mean() {
        let (x, y) = quadratic();
        let mut gb = GradientBoostingRegressor::new(
            BoostingParams {
                n_estimators: 0,
                ..BoostingParams::default()
            },
            1,
        );
        gb.fit(&x, &y).unwrap();
        let pred = gb.predict(&x).unwrap();
        assert!(pred.iter().all(|p| (p - y.mean()).abs() < 1e-9));
    }

    #[test]
    fn training_error_drops_with_rounds() {
        let (x, y) = quadratic();
        let mut short = GradientBoostingRegressor::new(
            BoostingParams {
                n_estimators: 5,
                ..BoostingParams::default()
            },
            1,
        );
        let mut long = GradientBoostingRegressor::new(BoostingParams::default(), 1);
        short.fit(&x, &y).unwrap();
        long.fit(&x, &y).unwrap();

        let err = |m: &GradientBoostingRegressor| (&y - m.predict(&x).unwrap()).norm_squared();
        assert!(err(&long) < err(&short));
        assert_eq!(long.n_estimators(), 100);
    }

    #[test]
    fn subsampled_fit_is_reproducible() {
        let (x, y) = quadratic();
        let params = BoostingParams {
            n_estimators: 20,
            subsample: 0.5,
            ..BoostingParams::default()
        };
        let mut a = GradientBoostingRegressor::new(params, 3);
        let mut b = GradientBoostingRegressor::new(params, 3);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }
}
