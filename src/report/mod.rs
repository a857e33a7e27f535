//! Reporting utilities: summary statistics, correlations and formatted
//! terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::error::Result;
use crate::math::{mean, pearson, quantile_sorted, sample_std};
use crate::table::Table;

/// `describe`-style statistics of one numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub missing: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Statistics for every numeric column, in table order.
pub fn describe(table: &Table) -> Result<Vec<ColumnStats>> {
    let mut out = Vec::new();
    for column in table.numeric_columns() {
        let values = table.f64_values(&column)?;
        let mut observed: Vec<f64> = values.iter().flatten().copied().collect();
        observed.sort_by(f64::total_cmp);
        out.push(ColumnStats {
            count: observed.len(),
            missing: values.len() - observed.len(),
            mean: mean(&observed),
            std: sample_std(&observed),
            min: observed.first().copied(),
            p25: quantile_sorted(&observed, 0.25),
            median: quantile_sorted(&observed, 0.5),
            p75: quantile_sorted(&observed, 0.75),
            max: observed.last().copied(),
            column,
        });
    }
    Ok(out)
}

/// Pairwise Pearson correlations. `None` where a column is constant.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }
}

/// Correlation matrix over the listed columns that exist in `table`.
pub fn correlation_matrix(table: &Table, columns: &[&str]) -> Result<CorrelationMatrix> {
    let mut names = Vec::new();
    let mut series = Vec::new();
    for &column in columns {
        if table.has_column(column) {
            names.push(column.to_string());
            series.push(table.f64_values(column)?);
        }
    }
    let values = series
        .iter()
        .map(|a| series.iter().map(|b| pearson(a, b)).collect())
        .collect();
    Ok(CorrelationMatrix {
        columns: names,
        values,
    })
}

/// Mean of `value` per distinct (rounded) value of `by`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: i64,
    pub count: usize,
    pub mean: f64,
}

/// Group means sorted by key. Rows missing either value are skipped.
pub fn group_means(table: &Table, by: &str, value: &str) -> Result<Vec<GroupMean>> {
    let keys = table.f64_values(by)?;
    let values = table.f64_values(value)?;
    let mut groups: BTreeMap<i64, (usize, f64)> = BTreeMap::new();
    for (k, v) in keys.iter().zip(&values) {
        if let (Some(k), Some(v)) = (k, v) {
            let entry = groups.entry(k.round() as i64).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += v;
        }
    }
    Ok(groups
        .into_iter()
        .map(|(key, (count, sum))| GroupMean {
            key,
            count,
            mean: sum / count as f64,
        })
        .collect())
}
