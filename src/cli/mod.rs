//! Command-line parsing for the store sales pipeline.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! cleaning and modeling code. Every handler turns its args into domain
//! types (`PipelineConfig`, `SampleConfig`) before doing any work.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{FlagDefault, ModelSpec};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "sales", version, about = "Store sales cleaning, exploration and baseline models")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Clean, join, normalize and fit models; write joined tables and submissions.
    Run(RunArgs),
    /// Print missing-value profiles and summary statistics of the raw tables.
    Profile(DataArgs),
    /// Clean and join, then print correlations and ASCII charts.
    Explore(ExploreArgs),
    /// Write a synthetic train/test/store dataset.
    Generate(GenerateArgs),
}

/// Location of the input CSVs.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Directory containing train.csv, test.csv and store.csv.
    #[arg(long, env = "SALES_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Output directory for joined tables and submissions.
    #[arg(long, env = "SALES_OUT_DIR", default_value = "out")]
    pub out_dir: PathBuf,

    /// Seed for the holdout split and model randomness.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of training rows held out for scoring.
    #[arg(long, default_value_t = 0.25)]
    pub test_size: f64,

    /// Value used for a missing flag, as COLUMN=VALUE (repeatable).
    ///
    /// Added to the built-in Open=1; giving Open here replaces that value.
    #[arg(long = "flag-default", value_name = "COLUMN=VALUE")]
    pub flag_defaults: Vec<FlagDefault>,

    /// Which model(s) to fit.
    #[arg(long, value_enum, default_value_t = ModelSpec::Default)]
    pub model: ModelSpec,

    /// Maximum depth of the single decision tree.
    #[arg(long, default_value_t = 16)]
    pub tree_depth: usize,

    /// Number of trees in the random forest.
    #[arg(long, default_value_t = 30)]
    pub forest_trees: usize,

    /// Maximum depth of each forest tree.
    #[arg(long, default_value_t = 14)]
    pub forest_depth: usize,

    /// Features sampled per forest split (all when omitted).
    #[arg(long)]
    pub forest_max_features: Option<usize>,

    /// Number of boosting rounds.
    #[arg(long, default_value_t = 100)]
    pub boosting_rounds: usize,

    /// Boosting learning rate.
    #[arg(long, default_value_t = 0.1)]
    pub learning_rate: f64,

    /// Depth of each boosting tree.
    #[arg(long, default_value_t = 3)]
    pub boosting_depth: usize,

    /// Row fraction sampled per boosting round.
    #[arg(long, default_value_t = 1.0)]
    pub subsample: f64,

    /// Skip writing train_store.csv / test_store.csv.
    #[arg(long)]
    pub no_joined: bool,

    /// Write a JSON run summary to this path.
    #[arg(long, value_name = "JSON")]
    pub summary: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct ExploreArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Chart width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Histogram bins.
    #[arg(long, default_value_t = 20)]
    pub bins: usize,
}

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Directory to write train.csv, test.csv and store.csv into.
    #[arg(long, env = "SALES_DATA_DIR", default_value = "data")]
    pub out_dir: PathBuf,

    /// Number of stores.
    #[arg(long, default_value_t = 20)]
    pub stores: usize,

    /// Days of training history per store.
    #[arg(long, default_value_t = 120)]
    pub days: usize,

    /// Days of test rows per store.
    #[arg(long, default_value_t = 14)]
    pub test_days: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}
