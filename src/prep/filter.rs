//! Row filters on encoded integer columns.

use std::collections::HashSet;

use polars::prelude::*;

use crate::error::Result;
use crate::table::Table;

/// Keep only rows of `table` whose `column` code also occurs in `reference`.
///
/// Rows with a missing code are dropped. Returns the filtered table and the
/// number of dropped rows.
pub fn restrict_to_domain(table: &Table, reference: &Table, column: &str) -> Result<(Table, usize)> {
    let domain: HashSet<i64> = reference.i64_values(column)?.into_iter().flatten().collect();
    let mask: Vec<bool> = table
        .i64_values(column)?
        .into_iter()
        .map(|v| v.is_some_and(|v| domain.contains(&v)))
        .collect();
    let dropped = mask.iter().filter(|keep| !**keep).count();
    Ok((table.filter(&mask)?, dropped))
}

/// Keep rows whose numeric `column` equals `value`.
pub fn filter_equals(table: &Table, column: &str, value: f64) -> Result<Table> {
    // Validates the dtype before the cast.
    table.f64_values(column)?;
    let values = table.series(column)?.cast(&DataType::Float64)?;
    let mask = values.f64()?.equal(value);
    table.filter_mask(&mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, codes: &[Option<i64>]) -> Table {
        Table::from_series(name, vec![Series::new("StateHoliday".into(), codes)]).unwrap()
    }

    #[test]
    fn rows_outside_reference_domain_are_dropped() {
        let train = table("train", &[Some(0), Some(3), Some(1), Some(2), None]);
        let test = table("test", &[Some(0), Some(1), Some(0)]);
        let (kept, dropped) = restrict_to_domain(&train, &test, "StateHoliday").unwrap();
        assert_eq!(dropped, 3);
        assert_eq!(kept.i64_values("StateHoliday").unwrap(), vec![Some(0), Some(1)]);
    }

    #[test]
    fn filter_equals_keeps_matching_rows_and_drops_missing() {
        let t = table("test", &[Some(1), Some(0), None, Some(1)]);
        let open = filter_equals(&t, "StateHoliday", 1.0).unwrap();
        assert_eq!(open.height(), 2);
    }
}
