//! Regression models.
//!
//! Every model fits on a dense feature matrix (`DMatrix<f64>`, one row per
//! observation) and a target vector. `Estimator` dispatches over the concrete
//! kinds so the trainer can treat them uniformly.

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod tree;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use linear::LinearRegression;
pub use tree::{DecisionTreeRegressor, TreeNode};

use nalgebra::{DMatrix, DVector};

use crate::domain::{ModelKind, ModelParams};
use crate::error::Result;

#[derive(Debug, Clone)]
pub enum Estimator {
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    Linear(LinearRegression),
}

impl Estimator {
    pub fn new(kind: ModelKind, params: &ModelParams, seed: u64) -> Self {
        match kind {
            ModelKind::DecisionTree => {
                Estimator::DecisionTree(DecisionTreeRegressor::new(params.tree).with_seed(seed))
            }
            ModelKind::RandomForest => {
                Estimator::RandomForest(RandomForestRegressor::new(params.forest, seed))
            }
            ModelKind::GradientBoosting => {
                Estimator::GradientBoosting(GradientBoostingRegressor::new(params.boosting, seed))
            }
            ModelKind::Linear => Estimator::Linear(LinearRegression::new()),
        }
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        match self {
            Estimator::DecisionTree(m) => m.fit(x, y),
            Estimator::RandomForest(m) => m.fit(x, y),
            Estimator::GradientBoosting(m) => m.fit(x, y),
            Estimator::Linear(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        match self {
            Estimator::DecisionTree(m) => m.predict(x),
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
            Estimator::Linear(m) => m.predict(x),
        }
    }
}
