//! Synthetic store sales dataset for smoke runs and tests.
//!
//! The generated tables have the same columns and quirks as the real inputs:
//! missing `Open` flags in test, Promo2 fields missing for stores without the
//! promotion, StateHoliday `b`/`c` only in train, and some stores without
//! competition data.

use std::path::Path;

use chrono::{Datelike, Days, NaiveDate};
use polars::prelude::{DataType, NamedFrom, Series};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use tracing::info;

use crate::domain::schema::{
    ASSORTMENT, COMPETITION_DISTANCE, COMPETITION_OPEN_SINCE_MONTH, COMPETITION_OPEN_SINCE_YEAR,
    CUSTOMERS, DATE, DAY_OF_WEEK, ID, OPEN, PROMO, PROMO_INTERVAL, PROMO2, PROMO2_SINCE_WEEK,
    PROMO2_SINCE_YEAR, SALES, SCHOOL_HOLIDAY, STATE_HOLIDAY, STORE, STORE_SCHEMA, STORE_TYPE,
    TEST_SCHEMA, TRAIN_SCHEMA,
};
use crate::error::{AppError, Result};
use crate::io::{RawData, write_table_csv};
use crate::table::{Table, date_series};

const PROMO_INTERVALS: [&str; 3] = ["Jan,Apr,Jul,Oct", "Feb,May,Aug,Nov", "Mar,Jun,Sept,Dec"];

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub stores: usize,
    /// Days of training history per store.
    pub days: usize,
    /// Days of test rows per store, directly after the training period.
    pub test_days: usize,
    pub seed: u64,
    pub start: NaiveDate,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            stores: 20,
            days: 120,
            test_days: 14,
            seed: 42,
            start: NaiveDate::from_ymd_opt(2013, 1, 1).unwrap_or_default(),
        }
    }
}

/// Per-store traits shared by the store table and the sales model.
struct StoreProfile {
    base_sales: f64,
    promo_lift: f64,
}

pub fn generate_dataset(config: &SampleConfig) -> Result<RawData> {
    if config.stores == 0 || config.days == 0 || config.test_days == 0 {
        return Err(AppError::Config(
            "stores, days and test days must all be > 0".to_string(),
        ));
    }
    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::Config(format!("noise distribution error: {e}")))?;

    let (store, profiles) = store_table(config.stores, &mut rng, &noise)?;
    let train = train_table(config, &profiles, &mut rng, &noise)?;
    let test = test_table(config, &mut rng)?;
    Ok(RawData { train, test, store })
}

/// Generate and write `train.csv`, `test.csv` and `store.csv` into `dir`.
pub fn write_dataset(dir: &Path, config: &SampleConfig) -> Result<RawData> {
    let data = generate_dataset(config)?;
    std::fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;
    for (file, table) in [
        (TRAIN_SCHEMA.file_name, &data.train),
        (TEST_SCHEMA.file_name, &data.test),
        (STORE_SCHEMA.file_name, &data.store),
    ] {
        write_table_csv(&dir.join(file), table)?;
    }
    info!(
        dir = %dir.display(),
        train = data.train.height(),
        test = data.test.height(),
        store = data.store.height(),
        "synthetic dataset written"
    );
    Ok(data)
}

fn store_table(
    n: usize,
    rng: &mut StdRng,
    noise: &Normal<f64>,
) -> Result<(Table, Vec<StoreProfile>)> {
    let mut ids: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut store_type: Vec<Option<String>> = Vec::with_capacity(n);
    let mut assortment: Vec<Option<String>> = Vec::with_capacity(n);
    let mut distance: Vec<Option<f64>> = Vec::with_capacity(n);
    let mut comp_month: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut comp_year: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut promo2: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut since_week: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut since_year: Vec<Option<i64>> = Vec::with_capacity(n);
    let mut interval: Vec<Option<String>> = Vec::with_capacity(n);
    let mut profiles = Vec::with_capacity(n);

    for i in 0..n {
        ids.push(Some(i as i64 + 1));
        let kind = ["a", "b", "c", "d"][rng.gen_range(0..4)];
        store_type.push(Some(kind.to_string()));
        assortment.push(Some(["a", "b", "c"][rng.gen_range(0..3)].to_string()));

        // The first store always has complete competition data.
        let known = i == 0 || rng.gen_bool(0.8);
        distance.push(
            (i == 0 || rng.gen_bool(0.95))
                .then(|| (7.5 + 1.2 * noise.sample(rng)).exp().round()),
        );
        comp_month.push(known.then(|| rng.gen_range(1..=12)));
        comp_year.push(known.then(|| rng.gen_range(1995..=2014)));

        let has_promo2 = i == 0 || rng.gen_bool(0.5);
        promo2.push(Some(i64::from(has_promo2)));
        if has_promo2 {
            since_week.push(Some(rng.gen_range(1..=52)));
            since_year.push(Some(rng.gen_range(2009..=2015)));
            interval.push(Some(PROMO_INTERVALS[rng.gen_range(0..3)].to_string()));
        } else {
            since_week.push(None);
            since_year.push(None);
            interval.push(None);
        }

        let type_factor = match kind {
            "b" => 1.6,
            "c" => 0.9,
            _ => 1.0,
        };
        profiles.push(StoreProfile {
            base_sales: (6000.0 + 1200.0 * noise.sample(rng)).max(2000.0) * type_factor,
            promo_lift: 0.15 + 0.2 * rng.gen_range(0.0..1.0),
        });
    }

    let table = Table::from_series(
        "store",
        vec![
            Series::new(STORE.into(), ids),
            Series::new(STORE_TYPE.into(), store_type),
            Series::new(ASSORTMENT.into(), assortment),
            Series::new(COMPETITION_DISTANCE.into(), distance),
            Series::new(COMPETITION_OPEN_SINCE_MONTH.into(), comp_month),
            Series::new(COMPETITION_OPEN_SINCE_YEAR.into(), comp_year),
            Series::new(PROMO2.into(), promo2),
            Series::new(PROMO2_SINCE_WEEK.into(), since_week),
            Series::new(PROMO2_SINCE_YEAR.into(), since_year),
            Series::new(PROMO_INTERVAL.into(), interval),
        ],
    )?;
    Ok((table, profiles))
}

fn day(start: NaiveDate, offset: usize) -> Result<NaiveDate> {
    start
        .checked_add_days(Days::new(offset as u64))
        .ok_or_else(|| AppError::Config(format!("date overflow at {start} + {offset} days")))
}

/// Holiday label for a day index. `b` and `c` only occur in the training period.
fn state_holiday(d: usize, training: bool) -> &'static str {
    if d % 29 == 7 {
        "a"
    } else if training && d % 47 == 11 {
        "b"
    } else if training && d % 61 == 17 {
        "c"
    } else {
        "0"
    }
}

fn train_table(
    config: &SampleConfig,
    profiles: &[StoreProfile],
    rng: &mut StdRng,
    noise: &Normal<f64>,
) -> Result<Table> {
    let rows = config.stores * config.days;
    let mut store: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut dow: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut date: Vec<Option<NaiveDate>> = Vec::with_capacity(rows);
    let mut sales: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut customers: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut open: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut promo: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut holiday: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut school: Vec<Option<String>> = Vec::with_capacity(rows);

    for d in 0..config.days {
        let today = day(config.start, d)?;
        let weekday = i64::from(today.weekday().number_from_monday());
        let label = state_holiday(d, true);
        let school_holiday = rng.gen_bool(0.2);
        // Promotions run store-wide on alternating weeks.
        let promo_today = (d / 7) % 2 == 0 && weekday <= 5;

        for (s, profile) in profiles.iter().enumerate() {
            let is_open = weekday != 7 && label == "0";
            let (day_sales, day_customers) = if is_open {
                let weekday_factor = 1.0 + 0.05 * (6 - weekday.min(6)) as f64;
                let lift = if promo_today { 1.0 + profile.promo_lift } else { 1.0 };
                let value = profile.base_sales * weekday_factor * lift
                    + 350.0 * noise.sample(rng);
                let value = value.max(0.0).round();
                (value, (value / 9.5 + 20.0 * noise.sample(rng)).max(0.0).round())
            } else {
                (0.0, 0.0)
            };

            store.push(Some(s as i64 + 1));
            dow.push(Some(weekday));
            date.push(Some(today));
            sales.push(Some(day_sales as i64));
            customers.push(Some(day_customers as i64));
            open.push(Some(i64::from(is_open)));
            promo.push(Some(i64::from(promo_today)));
            holiday.push(Some(label.to_string()));
            school.push(Some(if school_holiday { "1" } else { "0" }.to_string()));
        }
    }

    Table::from_series(
        "train",
        vec![
            Series::new(STORE.into(), store),
            Series::new(DAY_OF_WEEK.into(), dow),
            date_series(DATE, date),
            Series::new(SALES.into(), sales),
            Series::new(CUSTOMERS.into(), customers),
            Series::new(OPEN.into(), open),
            Series::new(PROMO.into(), promo),
            Series::new(STATE_HOLIDAY.into(), holiday),
            Series::new(SCHOOL_HOLIDAY.into(), school),
        ],
    )
}

fn test_table(config: &SampleConfig, rng: &mut StdRng) -> Result<Table> {
    let rows = config.stores * config.test_days;
    let mut id: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut store: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut dow: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut date: Vec<Option<NaiveDate>> = Vec::with_capacity(rows);
    let mut open: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut promo: Vec<Option<i64>> = Vec::with_capacity(rows);
    let mut holiday: Vec<Option<String>> = Vec::with_capacity(rows);
    let mut school: Vec<Option<String>> = Vec::with_capacity(rows);

    for t in 0..config.test_days {
        let d = config.days + t;
        let today = day(config.start, d)?;
        let weekday = i64::from(today.weekday().number_from_monday());
        let label = state_holiday(d, false);
        let school_holiday = rng.gen_bool(0.2);
        let promo_today = (d / 7) % 2 == 0 && weekday <= 5;

        for s in 0..config.stores {
            let row = id.len();
            let is_open = weekday != 7 && label == "0";
            // A few unknown Open flags, always including the first row.
            let flag = if row == 0 || rng.gen_bool(0.03) {
                None
            } else {
                Some(i64::from(is_open))
            };

            id.push(Some(row as i64 + 1));
            store.push(Some(s as i64 + 1));
            dow.push(Some(weekday));
            date.push(Some(today));
            open.push(flag);
            promo.push(Some(i64::from(promo_today)));
            holiday.push(Some(label.to_string()));
            school.push(Some(if school_holiday { "1" } else { "0" }.to_string()));
        }
    }

    Table::from_series(
        "test",
        vec![
            Series::new(ID.into(), id),
            Series::new(STORE.into(), store),
            Series::new(DAY_OF_WEEK.into(), dow),
            date_series(DATE, date),
            Series::new(OPEN.into(), open),
            Series::new(PROMO.into(), promo),
            Series::new(STATE_HOLIDAY.into(), holiday),
            Series::new(SCHOOL_HOLIDAY.into(), school),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prep::profile_missing;

    #[test]
    fn same_seed_same_dataset() {
        let a = generate_dataset(&SampleConfig::default()).unwrap();
        let b = generate_dataset(&SampleConfig::default()).unwrap();
        assert_eq!(a.train, b.train);
        assert_eq!(a.store, b.store);
    }

    #[test]
    fn shapes_and_quirks() {
        let config = SampleConfig {
            stores: 5,
            days: 70,
            test_days: 10,
            ..SampleConfig::default()
        };
        let data = generate_dataset(&config).unwrap();
        assert_eq!(data.train.height(), 350);
        assert_eq!(data.test.height(), 50);
        assert_eq!(data.store.height(), 5);

        assert!(profile_missing(&data.test).missing_in(OPEN).unwrap() >= 1);
        // Train carries holiday labels that test never does.
        let labels = data.train.str_values(STATE_HOLIDAY).unwrap();
        assert!(labels.iter().any(|l| l.as_deref() == Some("b")));
        let labels = data.test.str_values(STATE_HOLIDAY).unwrap();
        assert!(labels.iter().all(|l| matches!(l.as_deref(), Some("0" | "a"))));
        assert_eq!(data.store.dtype(COMPETITION_OPEN_SINCE_MONTH).unwrap(), DataType::Int64);
    }

    #[test]
    fn zero_stores_is_a_config_error() {
        let config = SampleConfig {
            stores: 0,
            ..SampleConfig::default()
        };
        assert!(matches!(generate_dataset(&config), Err(AppError::Config(_))));
    }
}
