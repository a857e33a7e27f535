//! Left join of record tables onto store attributes.
//!
//! The result has exactly one row per left row, in left order. Unmatched rows
//! get missing values in every right-hand column.

use std::collections::HashSet;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::error::{AppError, Result};
use crate::table::Table;

/// Scratch column that carries the left row order through the join.
const ROW_ORDER: &str = "__row";

/// Key overlap between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCoverage {
    /// Distinct left keys with no right match.
    pub left_unmatched: usize,
    /// Distinct right keys never referenced by the left table.
    pub right_unused: usize,
}

pub fn key_coverage(left: &Table, right: &Table, key: &str) -> Result<KeyCoverage> {
    let left_keys: HashSet<i64> = left.i64_values(key)?.into_iter().flatten().collect();
    let right_keys: HashSet<i64> = right.i64_values(key)?.into_iter().flatten().collect();
    Ok(KeyCoverage {
        left_unmatched: left_keys.difference(&right_keys).count(),
        right_unused: right_keys.difference(&left_keys).count(),
    })
}

/// Left-join `right` onto `left` by the integer column `key`.
///
/// Fails on a duplicated right key or on a non-key column present on both
/// sides. Missing left keys never match.
pub fn left_join(left: &Table, right: &Table, key: &str) -> Result<Table> {
    let right_keys = right.i64_values(key)?;
    let mut seen: HashSet<i64> = HashSet::with_capacity(right_keys.len());
    for k in right_keys.into_iter().flatten() {
        if !seen.insert(k) {
            return Err(AppError::DuplicateKey {
                table: right.name().to_string(),
                column: key.to_string(),
                key: k,
            });
        }
    }

    for name in right.names() {
        if name != key && left.has_column(&name) {
            return Err(AppError::ColumnConflict {
                left: left.name().to_string(),
                right: right.name().to_string(),
                column: name,
            });
        }
    }

    let left_keys = left.i64_values(key)?;
    let unmatched = left_keys
        .iter()
        .filter(|k| !k.is_some_and(|k| seen.contains(&k)))
        .count();
    if unmatched > 0 {
        warn!(
            left = left.name(),
            right = right.name(),
            unmatched,
            "rows without a join partner; attributes will be imputed"
        );
    }

    let left_df = with_i64_key(left.df(), key)?.with_row_index(ROW_ORDER.into(), None)?;
    let right_df = with_i64_key(right.df(), key)?;
    let joined = left_df
        .left_join(&right_df, [key], [key])?
        .sort([ROW_ORDER], SortMultipleOptions::default())?
        .drop(ROW_ORDER)?;

    let out = Table::new(left.name(), joined);
    debug!(rows = out.height(), columns = out.width(), "joined {} with {}", left.name(), right.name());
    Ok(out)
}

/// Both sides must agree on the key dtype for the hash join.
fn with_i64_key(df: &DataFrame, key: &str) -> Result<DataFrame> {
    let mut df = df.clone();
    let cast = df.column(key)?.cast(&DataType::Int64)?;
    df.with_column(cast)?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(stores: &[Option<i64>]) -> Table {
        let sales: Vec<i64> = (0..stores.len() as i64).collect();
        Table::from_series(
            "train",
            vec![
                Series::new("Store".into(), stores),
                Series::new("Sales".into(), sales),
            ],
        )
        .unwrap()
    }

    fn attributes() -> Table {
        Table::from_series(
            "store",
            vec![
                Series::new("Store".into(), &[2i64, 1]),
                Series::new("StoreType".into(), &[0i64, 1]),
                Series::new("CompetitionDistance".into(), &[570.0, 1270.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn join_preserves_left_rows_and_order() {
        let left = records(&[Some(1), Some(3), Some(2), Some(1), None]);
        let joined = left_join(&left, &attributes(), "Store").unwrap();
        assert_eq!(joined.height(), 5);
        assert_eq!(joined.name(), "train");
        assert_eq!(joined.i64_values("Store").unwrap(), left.i64_values("Store").unwrap());
        assert_eq!(joined.i64_values("Sales").unwrap(), left.i64_values("Sales").unwrap());
        assert_eq!(
            joined.f64_values("CompetitionDistance").unwrap(),
            vec![Some(1270.0), None, Some(570.0), Some(1270.0), None]
        );
        assert_eq!(joined.names(), vec!["Store", "Sales", "StoreType", "CompetitionDistance"]);
    }

    #[test]
    fn join_against_empty_right_keeps_every_row() {
        let left = records(&[Some(1), Some(2)]);
        let right = Table::from_series(
            "store",
            vec![
                Series::new("Store".into(), Vec::<i64>::new()),
                Series::new("Promo2".into(), Vec::<i64>::new()),
            ],
        )
        .unwrap();
        let joined = left_join(&left, &right, "Store").unwrap();
        assert_eq!(joined.height(), 2);
        assert_eq!(joined.null_count("Promo2").unwrap(), 2);
    }

    #[test]
    fn duplicate_right_key_is_rejected() {
        let right =
            Table::from_series("store", vec![Series::new("Store".into(), &[1i64, 1])]).unwrap();
        let err = left_join(&records(&[Some(1)]), &right, "Store").unwrap_err();
        assert!(matches!(err, AppError::DuplicateKey { key: 1, .. }));
    }

    #[test]
    fn shared_non_key_column_is_a_conflict() {
        let right = Table::from_series(
            "store",
            vec![
                Series::new("Store".into(), &[1i64]),
                Series::new("Sales".into(), &[5i64]),
            ],
        )
        .unwrap();
        let err = left_join(&records(&[Some(1)]), &right, "Store").unwrap_err();
        assert!(matches!(err, AppError::ColumnConflict { ref column, .. } if column == "Sales"));
    }

    #[test]
    fn coverage_counts_distinct_keys() {
        let left = records(&[Some(1), Some(3), Some(3)]);
        let cov = key_coverage(&left, &attributes(), "Store").unwrap();
        assert_eq!(cov, KeyCoverage { left_unmatched: 1, right_unused: 1 });
    }
}
