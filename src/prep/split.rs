//! Seeded random train/holdout partition.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::error::{AppError, Result};
use crate::table::Table;

/// Shuffle row indices with `seed` and hold out `ceil(n * test_size)` rows.
///
/// Returns `(train, holdout)`; both keep the shuffled row order.
pub fn train_test_split(table: &Table, test_size: f64, seed: u64) -> Result<(Table, Table)> {
    if !(test_size.is_finite() && test_size > 0.0 && test_size < 1.0) {
        return Err(AppError::Config(format!(
            "test size must be in (0, 1), got {test_size}"
        )));
    }
    let n = table.height();
    if n < 2 {
        return Err(AppError::EmptyTable(table.name().to_string()));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_size).ceil() as usize).clamp(1, n - 1);
    let (test_idx, train_idx) = indices.split_at(n_test);

    Ok((table.take(train_idx)?, table.take(test_idx)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table(n: i64) -> Table {
        let rows: Vec<i64> = (0..n).collect();
        Table::from_series("train", vec![Series::new("i".into(), rows)]).unwrap()
    }

    #[test]
    fn split_sizes_and_disjoint_rows() {
        let (train, holdout) = train_test_split(&table(10), 0.25, 42).unwrap();
        assert_eq!(holdout.height(), 3);
        assert_eq!(train.height(), 7);

        let mut all: Vec<i64> = train
            .i64_values("i")
            .unwrap()
            .into_iter()
            .chain(holdout.i64_values("i").unwrap())
            .flatten()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn same_seed_same_split() {
        let (a, _) = train_test_split(&table(20), 0.25, 7).unwrap();
        let (b, _) = train_test_split(&table(20), 0.25, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_fraction_is_a_config_error() {
        assert!(matches!(
            train_test_split(&table(4), 1.0, 1),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            train_test_split(&table(1), 0.5, 1),
            Err(AppError::EmptyTable(_))
        ));
    }
}
