//! Calendar fields derived from the date column.

use chrono::Datelike;
use polars::prelude::*;

use crate::domain::schema::{MONTH, YEAR};
use crate::error::Result;
use crate::table::Table;

/// Insert `Year` and `Month` right after `date_column`.
pub fn derive_year_month(table: &mut Table, date_column: &str) -> Result<()> {
    let (years, months): (Vec<Option<i64>>, Vec<Option<i64>>) = table
        .date_values(date_column)?
        .into_iter()
        .map(|d| {
            (
                d.map(|d| i64::from(d.year())),
                d.map(|d| i64::from(d.month())),
            )
        })
        .unzip();

    table.insert_after(date_column, YEAR, Series::new(YEAR.into(), years))?;
    table.insert_after(YEAR, MONTH, Series::new(MONTH.into(), months))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::table::date_series;
    use chrono::NaiveDate;

    #[test]
    fn year_and_month_follow_date() {
        let mut t = Table::from_series(
            "train",
            vec![
                date_series("Date", vec![NaiveDate::from_ymd_opt(2015, 7, 31), None]),
                Series::new("Sales".into(), &[Some(1i64), Some(2)]),
            ],
        )
        .unwrap();
        derive_year_month(&mut t, "Date").unwrap();
        assert_eq!(t.names(), vec!["Date", "Year", "Month", "Sales"]);
        assert_eq!(t.i64_values("Year").unwrap(), vec![Some(2015), None]);
        assert_eq!(t.i64_values("Month").unwrap(), vec![Some(7), None]);
    }

    #[test]
    fn non_date_column_is_a_type_error() {
        let mut t =
            Table::from_series("train", vec![Series::new("Date".into(), &["2015-07-31"])]).unwrap();
        let err = derive_year_month(&mut t, "Date").unwrap_err();
        assert!(matches!(err, AppError::TypeMismatch { ref expected, .. } if expected == "date"));
    }
}
