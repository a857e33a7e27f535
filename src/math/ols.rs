//! Ordinary least squares for the linear baseline.
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Solved through SVD so tall and rank-deficient design matrices are handled
//! without panicking. Encoded categorical features are often collinear
//! (e.g. a constant StateHoliday code after filtering), so a strict tolerance
//! is tried first and relaxed if it fails.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no finite solution is found at any tolerance.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Prepend a column of ones.
pub fn with_intercept(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.clone().insert_column(0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 1, &[0.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&with_intercept(&x), &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn duplicated_column_still_solves() {
        let x = DMatrix::from_row_slice(4, 2, &[0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]);
        let y = DVector::from_row_slice(&[1.0, 3.0, 5.0, 7.0]);
        let x = with_intercept(&x);

        let beta = solve_least_squares(&x, &y).unwrap();
        let fitted = &x * &beta;
        for (f, t) in fitted.iter().zip(y.iter()) {
            assert!((f - t).abs() < 1e-8);
        }
    }
}
