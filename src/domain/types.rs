//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from CLI flags
//! - passed between pipeline stages
//! - exported to the JSON run summary

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::schema::OPEN;

/// Which model(s) to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    /// Decision tree, random forest and gradient boosting.
    Default,
    /// The default set plus the linear least-squares baseline.
    All,
    Tree,
    Forest,
    Boosting,
    Linear,
}

impl ModelSpec {
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelSpec::Default => vec![
                ModelKind::DecisionTree,
                ModelKind::RandomForest,
                ModelKind::GradientBoosting,
            ],
            ModelSpec::All => vec![
                ModelKind::DecisionTree,
                ModelKind::RandomForest,
                ModelKind::GradientBoosting,
                ModelKind::Linear,
            ],
            ModelSpec::Tree => vec![ModelKind::DecisionTree],
            ModelSpec::Forest => vec![ModelKind::RandomForest],
            ModelSpec::Boosting => vec![ModelKind::GradientBoosting],
            ModelSpec::Linear => vec![ModelKind::Linear],
        }
    }
}

/// Concrete fitted model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    DecisionTree,
    RandomForest,
    GradientBoosting,
    Linear,
}

impl ModelKind {
    /// Label used for terminal output and submission file names.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::DecisionTree => "DecisionTree",
            ModelKind::RandomForest => "RandomForest",
            ModelKind::GradientBoosting => "GradientBoostingRegressor",
            ModelKind::Linear => "LinearRegression",
        }
    }

    pub fn submission_file(self) -> String {
        format!("{}.csv", self.display_name())
    }
}

/// A fixed value imputed into a flag column when it is missing.
///
/// Parsed from `COLUMN=VALUE`, e.g. `Open=1` ("assume the store is open").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagDefault {
    pub column: String,
    pub value: i64,
}

impl FlagDefault {
    pub fn new(column: impl Into<String>, value: i64) -> Self {
        Self {
            column: column.into(),
            value,
        }
    }
}

/// Flag defaults every run applies: a missing `Open` means the store was open.
pub fn builtin_flag_defaults() -> Vec<FlagDefault> {
    vec![FlagDefault::new(OPEN, 1)]
}

/// Built-in defaults overlaid with `user` entries.
///
/// A user entry replaces the built-in one for the same column; other user
/// entries are appended in the given order.
pub fn merge_flag_defaults(user: &[FlagDefault]) -> Vec<FlagDefault> {
    let mut merged = builtin_flag_defaults();
    for flag in user {
        match merged.iter_mut().find(|f| f.column == flag.column) {
            Some(existing) => existing.value = flag.value,
            None => merged.push(flag.clone()),
        }
    }
    merged
}

impl fmt::Display for FlagDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.column, self.value)
    }
}

impl FromStr for FlagDefault {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (column, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected COLUMN=VALUE, got '{s}'"))?;
        let column = column.trim();
        if column.is_empty() {
            return Err(format!("empty column name in '{s}'"));
        }
        let value = value
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("invalid flag value in '{s}': {e}"))?;
        Ok(FlagDefault::new(column, value))
    }
}

/// Decision tree hyper-parameters (also used for forest members).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features sampled at each split (`None` = all).
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: Some(16),
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub tree: TreeParams,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 30,
            tree: TreeParams {
                max_depth: Some(14),
                ..TreeParams::default()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows sampled for each boosting round.
    pub subsample: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelParams {
    pub tree: TreeParams,
    pub forest: ForestParams,
    pub boosting: BoostingParams,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub out_dir: PathBuf,

    /// Seed for the train/holdout split and all model randomness.
    pub seed: u64,
    /// Fraction of training rows held out for scoring.
    pub test_size: f64,

    pub flag_defaults: Vec<FlagDefault>,

    pub model_spec: ModelSpec,
    pub models: ModelParams,

    /// Write `train_store.csv` / `test_store.csv`.
    pub export_joined: bool,
    /// Write the JSON run summary.
    pub export_summary: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            out_dir: out_dir.into(),
            seed: 42,
            test_size: 0.25,
            flag_defaults: builtin_flag_defaults(),
            model_spec: ModelSpec::Default,
            models: ModelParams::default(),
            export_joined: true,
            export_summary: None,
        }
    }
}

/// Row counts at the main checkpoints of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowCounts {
    pub train_loaded: usize,
    pub test_loaded: usize,
    pub store_loaded: usize,
    pub train_joined: usize,
    pub test_joined: usize,
    pub train_fit: usize,
    pub holdout: usize,
    pub test_predicted: usize,
}

/// One statistical imputation that actually filled values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImputationRecord {
    pub table: String,
    pub column: String,
    pub filled: usize,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingSummary {
    pub column: String,
    pub offset: i64,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerSummary {
    pub column: String,
    pub mean: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model: ModelKind,
    pub holdout_r2: f64,
    pub holdout_rmse: f64,
    pub submission: String,
}

/// Everything a run produced, minus the data itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tool: String,
    pub generated_at: String,
    pub seed: u64,
    pub test_size: f64,
    pub rows: RowCounts,
    pub dropped_state_holiday: usize,
    pub flag_fills: Vec<(String, String, usize)>,
    pub imputations: Vec<ImputationRecord>,
    pub encodings: Vec<EncodingSummary>,
    pub scaler: Vec<ScalerSummary>,
    pub models: Vec<ModelScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_default_parses_column_and_value() {
        let flag: FlagDefault = "Open=1".parse().unwrap();
        assert_eq!(flag, FlagDefault::new("Open", 1));
        assert!("Open".parse::<FlagDefault>().is_err());
        assert!("=1".parse::<FlagDefault>().is_err());
        assert!("Open=yes".parse::<FlagDefault>().is_err());
        assert_eq!(flag.to_string(), "Open=1");
    }

    #[test]
    fn default_spec_fits_three_models() {
        let kinds = ModelSpec::Default.kinds();
        assert_eq!(kinds.len(), 3);
        assert!(!kinds.contains(&ModelKind::Linear));
        assert_eq!(ModelSpec::All.kinds().len(), 4);
    }
}
