//! CSV ingest into typed tables.
//!
//! Design goals:
//! - **Strict schema**: every expected column must be present (typed error)
//! - **Explicit typing**: date columns are parsed as dates, text columns stay
//!   strings even when they look numeric
//! - **Fail fast**: a malformed row or unparseable value aborts the load
//! - **Closed column set**: columns the schema does not list are dropped

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use polars::prelude::*;
use tracing::{info, warn};

use crate::domain::schema::{FieldKind, STORE_SCHEMA, TEST_SCHEMA, TRAIN_SCHEMA, TableSchema};
use crate::error::{AppError, Result};
use crate::table::{Table, date_series};

/// Cell spellings read as missing values.
const NULL_SPELLINGS: [&str; 5] = ["NA", "NaN", "nan", "null", "NULL"];

/// The three raw input tables.
#[derive(Debug, Clone)]
pub struct RawData {
    pub train: Table,
    pub test: Table,
    pub store: Table,
}

/// Load `train.csv`, `test.csv` and `store.csv` from `data_dir`.
pub fn load_datasets(data_dir: &Path) -> Result<RawData> {
    let train = load_table(&data_dir.join(TRAIN_SCHEMA.file_name), &TRAIN_SCHEMA)?;
    let test = load_table(&data_dir.join(TEST_SCHEMA.file_name), &TEST_SCHEMA)?;
    let store = load_table(&data_dir.join(STORE_SCHEMA.file_name), &STORE_SCHEMA)?;
    Ok(RawData { train, test, store })
}

/// Load one CSV file according to `schema`.
pub fn load_table(path: &Path, schema: &TableSchema) -> Result<Table> {
    let content = std::fs::read(path).map_err(|e| AppError::io(path, e))?;
    let table = read_table(&content, path, schema)?;
    info!(
        table = schema.name,
        rows = table.height(),
        columns = table.width(),
        "loaded {}",
        path.display()
    );
    Ok(table)
}

/// Parse CSV content. `origin` is only used in error messages.
///
/// The result holds exactly the schema's columns, in file order.
pub fn read_table(content: &[u8], origin: &Path, schema: &TableSchema) -> Result<Table> {
    let headers = header_names(content);
    ensure_required_columns_exist(schema, &headers)?;

    // Text and date fields are read verbatim; number fields are inferred.
    let overwrite = Schema::from_iter(
        schema
            .fields
            .iter()
            .filter(|(_, kind)| *kind != FieldKind::Number)
            .map(|(name, _)| Field::new((*name).into(), DataType::String)),
    );
    let parse_opts = CsvParseOptions::default().with_null_values(Some(NullValues::AllColumns(
        NULL_SPELLINGS.iter().map(|s| (*s).into()).collect(),
    )));

    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .with_schema_overwrite(Some(Arc::new(overwrite)))
        .with_parse_options(parse_opts)
        .into_reader_with_file_handle(Cursor::new(content))
        .finish()
        .map_err(|e| AppError::csv(origin, e))?;

    let kept: Vec<&str> = headers
        .iter()
        .map(String::as_str)
        .filter(|name| schema.kind_of(name).is_some())
        .collect();
    let dropped: Vec<&String> = headers
        .iter()
        .filter(|name| schema.kind_of(name).is_none())
        .collect();
    if !dropped.is_empty() {
        warn!(table = schema.name, columns = ?dropped, "dropping columns not in the input schema");
    }
    df = df.select(kept.iter().copied())?;

    let mut table = Table::new(schema.name, df);
    for (name, kind) in schema.fields {
        match kind {
            FieldKind::Text => {}
            FieldKind::Date => {
                let dates = parse_date_column(&table, name)?;
                table.put(name, dates)?;
            }
            FieldKind::Number => {
                if table.dtype(name)? == DataType::String {
                    let numbers = parse_number_column(&table, name)?;
                    table.put(name, numbers)?;
                }
            }
        }
    }
    Ok(table)
}

/// Header names of the first line, with a leading UTF-8 BOM stripped.
fn header_names(content: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(content);
    let first = text.lines().next().unwrap_or("");
    first
        .trim_start_matches('\u{feff}')
        .split(',')
        .map(|h| h.trim().trim_matches('"').to_string())
        .filter(|h| !h.is_empty())
        .collect()
}

fn ensure_required_columns_exist(schema: &TableSchema, headers: &[String]) -> Result<()> {
    for (name, _) in schema.fields {
        if !headers.iter().any(|h| h == name) {
            return Err(AppError::missing_column(schema.name, name));
        }
    }
    Ok(())
}

/// A number field that polars left as strings: either all cells are missing
/// or some cell is not a number.
fn parse_number_column(table: &Table, name: &str) -> Result<Series> {
    let cells = table.str_values(name)?;
    let ints: Option<Vec<Option<i64>>> = cells
        .iter()
        .map(|c| match c {
            None => Some(None),
            Some(s) => s.trim().parse::<i64>().ok().map(Some),
        })
        .collect();
    if let Some(ints) = ints {
        return Ok(Series::new(name.into(), ints));
    }

    let mut floats = Vec::with_capacity(cells.len());
    for (idx, cell) in cells.iter().enumerate() {
        let value = match cell {
            None => None,
            Some(s) => Some(parse_f64(s).ok_or_else(|| AppError::InvalidNumber {
                column: name.to_string(),
                line: idx + 2,
                value: s.clone(),
            })?),
        };
        floats.push(value);
    }
    Ok(Series::new(name.into(), floats))
}

fn parse_f64(s: &str) -> Option<f64> {
    let v = s.trim().parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}

fn parse_date_column(table: &Table, name: &str) -> Result<Series> {
    let cells = table.str_values(name)?;
    let mut dates = Vec::with_capacity(cells.len());
    for (idx, cell) in cells.iter().enumerate() {
        let value = match cell {
            None => None,
            Some(s) => Some(parse_date(s.trim()).ok_or_else(|| AppError::InvalidDate {
                column: name.to_string(),
                // +2: header line plus 1-based numbering.
                line: idx + 2,
                value: s.clone(),
            })?),
        };
        dates.push(value);
    }
    Ok(date_series(name, dates))
}

/// ISO dates are expected; a few common spreadsheet formats are accepted too.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    FMTS.iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schema::{OPEN, STATE_HOLIDAY};

    fn parse(csv: &str, schema: &TableSchema) -> Result<Table> {
        read_table(csv.as_bytes(), Path::new("inline.csv"), schema)
    }

    #[test]
    fn text_columns_stay_strings_and_dates_parse() {
        let csv = "Store,DayOfWeek,Date,Sales,Customers,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,5,2015-07-31,5263,555,1,1,0,1\n\
                   2,5,2015-07-31,6064,625,,1,a,1\n";
        let t = parse(csv, &TRAIN_SCHEMA).unwrap();
        assert_eq!(t.height(), 2);
        assert_eq!(t.dtype(STATE_HOLIDAY).unwrap(), DataType::String);
        assert_eq!(t.dtype("SchoolHoliday").unwrap(), DataType::String);
        assert_eq!(t.dtype("Date").unwrap(), DataType::Date);
        assert_eq!(t.i64_values(OPEN).unwrap(), vec![Some(1), None]);
    }

    #[test]
    fn float_values_promote_number_column() {
        let csv = "Store,StoreType,Assortment,CompetitionDistance,CompetitionOpenSinceMonth,\
                   CompetitionOpenSinceYear,Promo2,Promo2SinceWeek,Promo2SinceYear,PromoInterval\n\
                   1,c,a,1270.0,9,2008,0,,,\n\
                   2,a,a,570,11,2007,1,13,2010,\"Jan,Apr,Jul,Oct\"\n";
        let t = parse(csv, &STORE_SCHEMA).unwrap();
        assert_eq!(t.dtype("CompetitionDistance").unwrap(), DataType::Float64);
        assert_eq!(t.i64_values("Promo2SinceWeek").unwrap(), vec![None, Some(13)]);
        assert_eq!(
            t.str_values("PromoInterval").unwrap(),
            vec![None, Some("Jan,Apr,Jul,Oct".to_string())]
        );
    }

    #[test]
    fn all_missing_number_column_is_integer_nulls() {
        let csv = "Id,Store,DayOfWeek,Date,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,1,4,2015-09-17,,1,0,0\n\
                   2,3,4,2015-09-17,NA,1,0,0\n";
        let t = parse(csv, &TEST_SCHEMA).unwrap();
        assert_eq!(t.i64_values(OPEN).unwrap(), vec![None, None]);
    }

    #[test]
    fn unlisted_columns_are_dropped() {
        let csv = "Id,Store,Extra,DayOfWeek,Date,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,1,x,4,2015-09-17,1,1,0,0\n";
        let t = parse(csv, &TEST_SCHEMA).unwrap();
        assert!(!t.has_column("Extra"));
        assert_eq!(t.width(), TEST_SCHEMA.fields.len());
        assert!(t.string_columns().iter().all(|c| TEST_SCHEMA.kind_of(c) == Some(FieldKind::Text)));
    }

    #[test]
    fn missing_schema_column_is_reported() {
        let csv = "Store,DayOfWeek,Date\n1,5,2015-07-31\n";
        let err = parse(csv, &TRAIN_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { ref table, .. } if table == "train"));
    }

    #[test]
    fn bad_date_reports_line() {
        let csv = "Id,Store,DayOfWeek,Date,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,1,4,2015-09-17,1,1,0,0\n\
                   2,3,4,not-a-date,1,1,0,0\n";
        let err = parse(csv, &TEST_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate { line: 3, .. }));
    }

    #[test]
    fn bad_number_in_schema_column_is_an_error() {
        let csv = "Id,Store,DayOfWeek,Date,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,x,4,2015-09-17,1,1,0,0\n";
        let err = parse(csv, &TEST_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::InvalidNumber { ref column, .. } if column == "Store"));
    }

    #[test]
    fn row_with_extra_fields_is_a_csv_error() {
        let csv = "Id,Store,DayOfWeek,Date,Open,Promo,StateHoliday,SchoolHoliday\n\
                   1,1,4,2015-09-17,1,1,0,0,9,9\n";
        let err = parse(csv, &TEST_SCHEMA).unwrap_err();
        assert!(matches!(err, AppError::Csv { .. }));
    }
}
