//! CART regression tree (squared-error splits).

use nalgebra::{DMatrix, DVector};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::domain::TreeParams;
use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

impl TreeNode {
    fn predict(&self, x: &DMatrix<f64>, row: usize) -> f64 {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if x[(row, *feature)] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    fn leaves(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Split { left, right, .. } => left.leaves() + right.leaves(),
        }
    }
}

/// Best split found for one feature.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

#[derive(Debug, Clone)]
pub struct DecisionTreeRegressor {
    params: TreeParams,
    seed: u64,
    root: Option<TreeNode>,
    n_features: usize,
}

impl DecisionTreeRegressor {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            seed: 0,
            root: None,
            n_features: 0,
        }
    }

    /// Seed for per-node feature sampling (only used when `max_features` is set).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: &DMatrix<f64>, y: &DVector<f64>) -> Result<()> {
        let rows: Vec<usize> = (0..x.nrows()).collect();
        self.fit_rows(x, y, &rows)
    }

    /// Fit on a subset of rows (repeats allowed, as in a bootstrap sample).
    pub fn fit_rows(&mut self, x: &DMatrix<f64>, y: &DVector<f64>, rows: &[usize]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(AppError::Model(format!(
                "feature rows ({}) and target length ({}) differ",
                x.nrows(),
                y.len()
            )));
        }
        if rows.is_empty() {
            return Err(AppError::Model("cannot fit a tree on zero rows".to_string()));
        }
        self.n_features = x.ncols();
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.root = Some(self.build(x, y, rows, 0, &mut rng));
        Ok(())
    }

    fn build(
        &self,
        x: &DMatrix<f64>,
        y: &DVector<f64>,
        rows: &[usize],
        depth: usize,
        rng: &mut StdRng,
    ) -> TreeNode {
        let n_samples = rows.len();
        let value = rows.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;
        let leaf = TreeNode::Leaf { value, n_samples };

        let p = &self.params;
        if n_samples < p.min_samples_split.max(2)
            || n_samples < 2 * p.min_samples_leaf.max(1)
            || p.max_depth.is_some_and(|d| depth >= d)
            || rows.iter().all(|&i| y[i] == y[rows[0]])
        {
            return leaf;
        }

        let features = self.candidate_features(rng);
        let Some(best) = best_split(x, y, rows, &features, p.min_samples_leaf.max(1)) else {
            return leaf;
        };

        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .copied()
            .partition(|&i| x[(i, best.feature)] <= best.threshold);

        let left = Box::new(self.build(x, y, &left_rows, depth + 1, rng));
        let right = Box::new(self.build(x, y, &right_rows, depth + 1, rng));
        TreeNode::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
            n_samples,
        }
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        let mut all: Vec<usize> = (0..self.n_features).collect();
        match self.params.max_features {
            Some(k) if k > 0 && k < self.n_features => {
                all.shuffle(rng);
                all.truncate(k);
                all.sort_unstable();
                all
            }
            _ => all,
        }
    }

    pub fn predict(&self, x: &DMatrix<f64>) -> Result<DVector<f64>> {
        let root = self.root()?;
        if x.ncols() != self.n_features {
            return Err(AppError::Model(format!(
                "tree was fitted on {} features, got {}",
                self.n_features,
                x.ncols()
            )));
        }
        Ok(DVector::from_iterator(
            x.nrows(),
            (0..x.nrows()).map(|r| root.predict(x, r)),
        ))
    }

    fn root(&self) -> Result<&TreeNode> {
        self.root
            .as_ref()
            .ok_or_else(|| AppError::Model("decision tree is not fitted".to_string()))
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    pub fn n_leaves(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::leaves)
    }
}

/// Scan every feature in parallel and keep the largest SSE reduction.
///
/// Ties go to the lowest feature index so fits are reproducible.
fn best_split(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    rows: &[usize],
    features: &[usize],
    min_leaf: usize,
) -> Option<Candidate> {
    let candidates: Vec<Option<Candidate>> = features
        .par_iter()
        .map(|&f| best_split_for_feature(x, y, rows, f, min_leaf))
        .collect();

    candidates
        .into_iter()
        .flatten()
        .fold(None, |best: Option<Candidate>, c| match best {
            Some(b) if b.gain >= c.gain => Some(b),
            _ => Some(c),
        })
}

fn best_split_for_feature(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
    rows: &[usize],
    feature: usize,
    min_leaf: usize,
) -> Option<Candidate> {
    let mut pairs: Vec<(f64, f64)> = rows.iter().map(|&i| (x[(i, feature)], y[i])).collect();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

    let n = pairs.len();
    let total: f64 = pairs.iter().map(|p| p.1).sum();
    let parent = total * total / n as f64;

    let mut best: Option<Candidate> = None;
    let mut left_sum = 0.0;
    for i in 0..n - 1 {
        left_sum += pairs[i].1;
        let n_left = i + 1;
        let n_right = n - n_left;
        if pairs[i].0 == pairs[i + 1].0 || n_left < min_leaf || n_right < min_leaf {
            continue;
        }
        let right_sum = total - left_sum;
        // SSE reduction = Σl²/nl + Σr²/nr - Σ²/n
        let gain = left_sum * left_sum / n_left as f64 + right_sum * right_sum / n_right as f64
            - parent;
        if gain > 1e-12 && best.is_none_or(|b| gain > b.gain) {
            best = Some(Candidate {
                feature,
                threshold: (pairs[i].0 + pairs[i + 1].0) / 2.0,
                gain,
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (DMatrix<f64>, DVector<f64>) {
        // y depends on feature 1 only: 10 below 5, 50 above.
        let n = 20;
        let mut x = DMatrix::zeros(n, 2);
        let mut y = DVector::zeros(n);
        for i in 0..n {
            x[(i, 0)] = (i % 3) as f64;
            x[(i, 1)] = i as f64;
            y[i] = if i < 10 { 10.0 } else { 50.0 };
        }
        (x, y)
    }

    #[test]
    fn learns_a_step_function_exactly() {
        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::new(TreeParams::default());
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&x).unwrap(), y);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
    }

    #[test]
    fn max_depth_zero_predicts_the_mean() {
        let (x, y) = step_data();
        let mut tree = DecisionTreeRegressor::new(TreeParams {
            max_depth: Some(0),
            ..TreeParams::default()
        });
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&x).unwrap();
        assert!(pred.iter().all(|p| (p - 30.0).abs() < 1e-12));
    }

    #[test]
    fn min_samples_leaf_is_respected() {
        let x = DMatrix::from_row_slice(4, 1, &[0.0, 1.0, 2.0, 3.0]);
        let y = DVector::from_row_slice(&[0.0, 0.0, 0.0, 100.0]);
        let mut tree = DecisionTreeRegressor::new(TreeParams {
            min_samples_leaf: 2,
            ..TreeParams::default()
        });
        tree.fit(&x, &y).unwrap();
        let pred = tree.predict(&x).unwrap();
        assert_eq!(pred[0], 0.0);
        assert_eq!(pred[3], 50.0);
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let tree = DecisionTreeRegressor::new(TreeParams::default());
        assert!(matches!(
            tree.predict(&DMatrix::zeros(1, 1)),
            Err(AppError::Model(_))
        ));
    }
}
