//! Bagged regression trees.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::domain::ForestParams;
use crate::error::{AppError, Result};
use crate::models::tree::DecisionTreeRegressor;

#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    params: ForestParams,
    seed: u64,
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            trees: Vec::new(),
        }
    }

    /// Each tree gets its own bootstrap sample drawn from `seed + tree index`,
    /// so the forest is identical regardless of thread scheduling.
    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            return Err(AppError::Model("cannot fit a forest on zero rows".to_string()));
        }
        if self.params.n_trees == 0 {
            return Err(AppError::Model("forest needs at least one tree".to_string()));
        }

        let tree_params = self.params.tree;
        let seed = self.seed;
        self.trees = (0..self.params.n_trees)
            .into_par_iter()
            .map(|t| {
                let tree_seed = seed.wrapping_add(t as u64);
                let mut rng = StdRng::seed_from_u64(tree_seed);
                let rows: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                let mut tree = DecisionTreeRegressor::new(tree_params).with_seed(tree_seed);
                tree.fit_rows(x, y, &rows)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(())
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        if self.trees.is_empty() {
            return Err(AppError::Model("random forest is not fitted".to_string()));
        }
        let per_tree: Vec<DVector<f64>> = self
            .trees
            .par_iter()
            .map(|t| t.predict(x))
            .collect::<Result<_>>()?;
        let mut sum = DVector::<f64>::zeros(x.nrows());
        for p in &per_tree {
            sum += p;
        }
        Ok(sum / self.trees.len() as f64)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TreeParams;

    fn linear_data() -> (DMatrix<f64>, DVector<f64>) {
        let n = 60;
        let x = DMatrix::from_fn(n, 1, |i, _| i as f64);
        let y = DVector::from_fn(n, |i, _| 3.0 * i as f64);
        (x, y)
    }

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 8,
            tree: TreeParams::default(),
        }
    }

    #[test]
    fn same_seed_gives_identical_predictions() {
        let (x, y) = linear_data();
        let mut a = RandomForestRegressor::new(params(), 42);
        let mut b = RandomForestRegressor::new(params(), 42);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
        assert_eq!(a.n_trees(), 8);
    }

    #[test]
    fn averages_stay_inside_target_range() {
        let (x, y) = linear_data();
        let mut forest = RandomForestRegressor::new(params(), 7);
        forest.fit(&x, &y).unwrap();
        let pred = forest.predict(&x).unwrap();
        assert!(pred.iter().all(|p| (0.0..=177.0).contains(p)));
        let r2 = crate::math::r2_score(y.as_slice(), pred.as_slice());
        assert!(r2 > 0.95, "r2 = {r2}");
    }
}
