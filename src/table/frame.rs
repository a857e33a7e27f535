//! A named polars `DataFrame` with typed column access.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{AppError, Result};

/// Integer and float dtypes; everything else is non-numeric for the pipeline.
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

pub fn is_integer_dtype(dtype: &DataType) -> bool {
    is_numeric_dtype(dtype) && !matches!(dtype, DataType::Float32 | DataType::Float64)
}

/// A polars `Date` series from calendar dates.
pub fn date_series(name: &str, dates: Vec<Option<NaiveDate>>) -> Series {
    DateChunked::from_naive_date_options(name.into(), dates).into_series()
}

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    df: DataFrame,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.df.equals_missing(&other.df)
    }
}

impl Table {
    pub fn new(name: impl Into<String>, df: DataFrame) -> Self {
        Self {
            name: name.into(),
            df,
        }
    }

    /// Build a table from equal-length series.
    pub fn from_series(name: impl Into<String>, series: Vec<Series>) -> Result<Self> {
        let df = DataFrame::new(series.into_iter().map(Column::from).collect())?;
        Ok(Self::new(name, df))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn width(&self) -> usize {
        self.df.width()
    }

    pub fn names(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_index(name).is_some()
    }

    pub fn series(&self, name: &str) -> Result<&Series> {
        self.df
            .column(name)
            .map(Column::as_materialized_series)
            .map_err(|_| AppError::missing_column(&self.name, name))
    }

    pub fn dtype(&self, name: &str) -> Result<DataType> {
        Ok(self.series(name)?.dtype().clone())
    }

    pub fn null_count(&self, name: &str) -> Result<usize> {
        Ok(self.series(name)?.null_count())
    }

    fn type_mismatch(&self, name: &str, expected: &str) -> Result<AppError> {
        Ok(AppError::TypeMismatch {
            column: name.to_string(),
            expected: expected.to_string(),
            actual: self.dtype(name)?.to_string(),
        })
    }

    /// Numeric view of a column. Fails for non-numeric columns.
    pub fn f64_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let series = self.series(name)?;
        if !is_numeric_dtype(series.dtype()) {
            return Err(self.type_mismatch(name, "numeric")?);
        }
        let cast = series.cast(&DataType::Float64)?;
        Ok(cast.f64()?.into_iter().collect())
    }

    /// Integer view of a column. Fails for float and non-numeric columns.
    pub fn i64_values(&self, name: &str) -> Result<Vec<Option<i64>>> {
        let series = self.series(name)?;
        if !is_integer_dtype(series.dtype()) {
            return Err(self.type_mismatch(name, "integer")?);
        }
        let cast = series.cast(&DataType::Int64)?;
        Ok(cast.i64()?.into_iter().collect())
    }

    /// String view of a column. Fails for non-string columns.
    pub fn str_values(&self, name: &str) -> Result<Vec<Option<String>>> {
        let series = self.series(name)?;
        if series.dtype() != &DataType::String {
            return Err(self.type_mismatch(name, "string")?);
        }
        Ok(series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    pub fn date_values(&self, name: &str) -> Result<Vec<Option<NaiveDate>>> {
        let series = self.series(name)?;
        if series.dtype() != &DataType::Date {
            return Err(self.type_mismatch(name, "date")?);
        }
        Ok(series.date()?.as_date_iter().collect())
    }

    /// Replace a column in place, or append it. The series is renamed to `name`.
    pub fn put(&mut self, name: &str, mut series: Series) -> Result<()> {
        series.rename(name.into());
        self.df.with_column(series)?;
        Ok(())
    }

    /// Insert a new column directly after `after`.
    pub fn insert_after(&mut self, after: &str, name: &str, mut series: Series) -> Result<()> {
        if self.has_column(name) {
            return self.put(name, series);
        }
        let anchor = self
            .df
            .get_column_index(after)
            .ok_or_else(|| AppError::missing_column(&self.name, after))?;
        series.rename(name.into());
        self.df.insert_column(anchor + 1, series)?;
        Ok(())
    }

    pub fn drop(&mut self, name: &str) -> Result<()> {
        if !self.has_column(name) {
            return Err(AppError::missing_column(&self.name, name));
        }
        self.df.drop_in_place(name)?;
        Ok(())
    }

    /// Copy of the table restricted to (and ordered by) `names`.
    pub fn select(&self, names: &[&str]) -> Result<Table> {
        for name in names {
            if !self.has_column(name) {
                return Err(AppError::missing_column(&self.name, name));
            }
        }
        let df = self.df.select(names.iter().copied())?;
        Ok(Table::new(self.name.clone(), df))
    }

    /// Gather rows by position. Indices must be in bounds.
    pub fn take(&self, rows: &[usize]) -> Result<Table> {
        let idx = IdxCa::from_vec(
            "idx".into(),
            rows.iter().map(|&r| r as IdxSize).collect(),
        );
        Ok(Table::new(self.name.clone(), self.df.take(&idx)?))
    }

    pub fn filter(&self, mask: &[bool]) -> Result<Table> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        self.filter_mask(&mask)
    }

    /// Keep rows where `mask` is true; null mask entries drop the row.
    pub fn filter_mask(&self, mask: &BooleanChunked) -> Result<Table> {
        Ok(Table::new(self.name.clone(), self.df.filter(mask)?))
    }

    /// Names of numeric (integer or float) columns, in table order.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| is_numeric_dtype(c.dtype()))
            .map(|c| c.name().to_string())
            .collect()
    }

    /// Names of string-typed (not yet encoded) columns.
    pub fn string_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|c| c.dtype() == &DataType::String)
            .map(|c| c.name().to_string())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_series(
            "t",
            vec![
                Series::new("a".into(), &[Some(1i64), Some(2), Some(3)]),
                Series::new("b".into(), &[Some(0.5), None, Some(1.5)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn missing_column_is_a_typed_error() {
        let t = sample();
        let err = t.series("zzz").unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { ref column, .. } if column == "zzz"));
    }

    #[test]
    fn put_rejects_wrong_length() {
        let mut t = sample();
        let err = t.put("c", Series::new("c".into(), &[1i64])).unwrap_err();
        assert!(matches!(err, AppError::Polars(_)));
    }

    #[test]
    fn insert_after_places_column_next_to_anchor() {
        let mut t = sample();
        t.insert_after("a", "c", Series::new("x".into(), &[None::<i64>, None, None]))
            .unwrap();
        assert_eq!(t.names(), vec!["a", "c", "b"]);
    }

    #[test]
    fn filter_and_select_keep_order() {
        let t = sample();
        let filtered = t.filter(&[true, false, true]).unwrap();
        assert_eq!(filtered.height(), 2);
        let selected = filtered.select(&["b", "a"]).unwrap();
        assert_eq!(selected.names(), vec!["b", "a"]);
        assert_eq!(selected.i64_values("a").unwrap(), vec![Some(1), Some(3)]);
        assert!(matches!(
            selected.select(&["zzz"]),
            Err(AppError::MissingColumn { .. })
        ));
    }

    #[test]
    fn typed_views_check_dtype() {
        let t = sample();
        assert_eq!(t.f64_values("a").unwrap(), vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(matches!(t.i64_values("b"), Err(AppError::TypeMismatch { .. })));
        assert!(matches!(t.str_values("a"), Err(AppError::TypeMismatch { .. })));
        assert_eq!(t.null_count("b").unwrap(), 1);
        assert_eq!(t.numeric_columns(), vec!["a", "b"]);
        assert!(t.string_columns().is_empty());
    }

    #[test]
    fn take_gathers_rows() {
        let t = sample().take(&[2, 0]).unwrap();
        assert_eq!(t.i64_values("a").unwrap(), vec![Some(3), Some(1)]);
        assert_eq!(t.f64_values("b").unwrap(), vec![Some(1.5), Some(0.5)]);
    }
}
