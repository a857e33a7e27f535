//! Model frames, feature matrices and model fitting.
//!
//! The flow for one run:
//!
//! 1. turn the joined train/test tables into model frames (drop `Customers`
//!    and `Date`, reverse `Year` against the training maximum)
//! 2. keep only open stores in the test frame
//! 3. split train into fit/holdout partitions
//! 4. fit the scaler on the fit partition and apply it to all three
//! 5. fit each requested model, score it on the holdout rows and predict test

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use crate::domain::schema::{CUSTOMERS, DATE, ID, OPEN, SALES, YEAR};
use crate::domain::{ModelKind, ModelParams};
use crate::error::{AppError, Result};
use crate::math::{r2_score, rmse};
use crate::models::Estimator;
use crate::prep::{StandardScaler, filter_equals, reverse_scale_with_max, train_test_split};
use crate::table::Table;

/// Dense, scaled inputs for every model.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub features: Vec<String>,
    pub x_train: DMatrix<f64>,
    pub y_train: DVector<f64>,
    pub x_holdout: DMatrix<f64>,
    pub y_holdout: DVector<f64>,
    pub x_test: DMatrix<f64>,
    pub scaler: StandardScaler,
    /// Largest training `Year`, used to reverse `Year` in both frames.
    pub max_year: f64,
}

#[derive(Debug, Clone)]
pub struct ModelOutcome {
    pub kind: ModelKind,
    pub holdout_r2: f64,
    pub holdout_rmse: f64,
    pub predictions: Vec<f64>,
}

/// Drop columns the models never see and reverse `Year`.
pub fn model_frame(table: &Table, max_year: f64) -> Result<Table> {
    let mut frame = table.clone();
    for column in [CUSTOMERS, DATE, ID] {
        if frame.has_column(column) {
            frame.drop(column)?;
        }
    }
    reverse_scale_with_max(&mut frame, YEAR, max_year)?;
    Ok(frame)
}

pub fn build_model_data(
    train: &Table,
    test: &Table,
    seed: u64,
    test_size: f64,
) -> Result<ModelData> {
    let max_year = train
        .f64_values(YEAR)?
        .into_iter()
        .flatten()
        .reduce(f64::max)
        .ok_or_else(|| AppError::EmptyColumn {
            table: train.name().to_string(),
            column: YEAR.to_string(),
        })?;

    let train_frame = model_frame(train, max_year)?;
    let open_test = filter_equals(test, OPEN, 1.0)?;
    if open_test.height() == 0 {
        warn!("test table has no open stores; submissions will be empty");
    }
    let test_frame = model_frame(&open_test, max_year)?;

    let features: Vec<String> = train_frame
        .names()
        .iter()
        .filter(|n| n.as_str() != SALES)
        .cloned()
        .collect();
    let feature_refs: Vec<&str> = features.iter().map(String::as_str).collect();
    // Aligns the test columns to the training feature order.
    let mut test_frame = test_frame.select(&feature_refs)?;

    let (mut fit_part, mut holdout) = train_test_split(&train_frame, test_size, seed)?;
    let scaler = StandardScaler::fit(&fit_part, &features)?;
    scaler.transform(&mut fit_part)?;
    scaler.transform(&mut holdout)?;
    scaler.transform(&mut test_frame)?;

    let data = ModelData {
        x_train: table_to_matrix(&fit_part, &features)?,
        y_train: target_vector(&fit_part, SALES)?,
        x_holdout: table_to_matrix(&holdout, &features)?,
        y_holdout: target_vector(&holdout, SALES)?,
        x_test: table_to_matrix(&test_frame, &features)?,
        features,
        scaler,
        max_year,
    };
    info!(
        features = data.features.len(),
        train = data.x_train.nrows(),
        holdout = data.x_holdout.nrows(),
        test = data.x_test.nrows(),
        "model data ready"
    );
    Ok(data)
}

/// Row-major copy of the given numeric columns. Missing values are an error.
pub fn table_to_matrix(table: &Table, columns: &[String]) -> Result<DMatrix<f64>> {
    let mut x = DMatrix::zeros(table.height(), columns.len());
    for (j, column) in columns.iter().enumerate() {
        for (i, value) in table.f64_values(column)?.into_iter().enumerate() {
            x[(i, j)] = value.ok_or_else(|| missing_value(table, column, i))?;
        }
    }
    Ok(x)
}

pub fn target_vector(table: &Table, column: &str) -> Result<DVector<f64>> {
    let values = table
        .f64_values(column)?
        .into_iter()
        .enumerate()
        .map(|(i, v)| v.ok_or_else(|| missing_value(table, column, i)))
        .collect::<Result<Vec<f64>>>()?;
    Ok(DVector::from_vec(values))
}

fn missing_value(table: &Table, column: &str, row: usize) -> AppError {
    AppError::Model(format!(
        "{}.{column} has a missing value at row {row}; impute before fitting",
        table.name()
    ))
}

/// Fit each model on the training partition, score it on the holdout rows
/// and predict the test rows.
pub fn fit_models(
    data: &ModelData,
    kinds: &[ModelKind],
    params: &ModelParams,
    seed: u64,
) -> Result<Vec<ModelOutcome>> {
    let mut outcomes = Vec::with_capacity(kinds.len());
    for &kind in kinds {
        info!(model = kind.display_name(), "fitting");
        let mut model = Estimator::new(kind, params, seed);
        model.fit(&data.x_train, &data.y_train)?;

        let holdout = model.predict(&data.x_holdout)?;
        let holdout_r2 = r2_score(data.y_holdout.as_slice(), holdout.as_slice());
        let holdout_rmse = rmse(data.y_holdout.as_slice(), holdout.as_slice());
        info!(model = kind.display_name(), holdout_r2, holdout_rmse, "scored");

        let predictions = model.predict(&data.x_test)?.iter().copied().collect();
        outcomes.push(ModelOutcome {
            kind,
            holdout_r2,
            holdout_rmse,
            predictions,
        });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::{NamedFrom, Series};

    fn joined_train(n: usize) -> Table {
        let ints = |name: &str, f: &dyn Fn(usize) -> i64| {
            Series::new(name.into(), (0..n).map(f).collect::<Vec<i64>>())
        };
        Table::from_series(
            "train",
            vec![
                ints("Store", &|i| (i % 4) as i64 + 1),
                ints("Year", &|i| 2013 + (i % 3) as i64),
                ints("Customers", &|i| 100 + i as i64),
                ints("Promo", &|i| (i % 2) as i64),
                ints("Sales", &|i| 1000 + 500 * (i % 2) as i64),
            ],
        )
        .unwrap()
    }

    fn joined_test() -> Table {
        Table::from_series(
            "test",
            vec![
                Series::new("Id".into(), &[1i64, 2, 3]),
                Series::new("Store".into(), &[1i64, 2, 3]),
                Series::new("Year".into(), &[2015i64; 3]),
                Series::new("Open".into(), &[1i64, 0, 1]),
                Series::new("Promo".into(), &[1i64, 0, 0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn model_frame_drops_unused_columns_and_reverses_year() {
        let frame = model_frame(&joined_train(3), 2015.0).unwrap();
        assert_eq!(frame.names(), vec!["Store", "Year", "Promo", "Sales"]);
        assert_eq!(
            frame.f64_values("Year").unwrap(),
            vec![Some(2.0), Some(1.0), Some(0.0)]
        );
    }

    #[test]
    fn training_feature_absent_from_test_is_reported() {
        let mut test = joined_test();
        test.drop("Promo").unwrap();
        let err = build_model_data(&joined_train(8), &test, 42, 0.25).unwrap_err();
        assert!(matches!(err, AppError::MissingColumn { ref column, .. } if column == "Promo"));
    }

    #[test]
    fn shapes_line_up_and_promo_is_learned() {
        let mut train = joined_train(40);
        train.put("Open", Series::new("Open".into(), vec![1i64; 40])).unwrap();
        let data = build_model_data(&train, &joined_test(), 42, 0.25).unwrap();

        assert_eq!(data.features, vec!["Store", "Year", "Promo", "Open"]);
        assert_eq!(data.x_train.nrows(), 30);
        assert_eq!(data.x_holdout.nrows(), 10);
        assert_eq!(data.x_test.nrows(), 2);
        assert_eq!(data.max_year, 2015.0);

        let outcomes = fit_models(
            &data,
            &[ModelKind::DecisionTree, ModelKind::Linear],
            &ModelParams::default(),
            42,
        )
        .unwrap();
        assert_eq!(outcomes.len(), 2);
        for o in &outcomes {
            assert!(o.holdout_r2 > 0.99, "{:?} r2 {}", o.kind, o.holdout_r2);
            assert_eq!(o.predictions.len(), 2);
            // Test row 0 has Promo = 1, row 2 has Promo = 0.
            assert!((o.predictions[0] - 1500.0).abs() < 1e-6);
            assert!((o.predictions[1] - 1000.0).abs() < 1e-6);
        }
    }
}
