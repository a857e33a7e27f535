//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - runs the pipeline or one of the inspection commands
//! - prints reports/charts

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DataArgs, ExploreArgs, GenerateArgs, RunArgs};
use crate::data::{SampleConfig, write_dataset};
use crate::domain::schema::{
    CORRELATION_COLUMNS, CUSTOMERS, DAY_OF_WEEK, MONTH, OPEN, SALES, STATE_HOLIDAY, STORE_TYPE,
    YEAR,
};
use crate::domain::{
    BoostingParams, ForestParams, ModelParams, PipelineConfig, TreeParams, builtin_flag_defaults,
    merge_flag_defaults,
};
use crate::error::Result;
use crate::io::load_datasets;
use crate::math::{solve_least_squares, with_intercept};
use crate::prep::{filter_equals, profile_missing};
use crate::report::{
    correlation_matrix, describe, format_correlation, format_describe, format_profile,
    format_run_summary, group_means,
};

pub mod pipeline;

/// Entry point for the `sales` binary.
pub fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Profile(args) => handle_profile(args),
        Command::Explore(args) => handle_explore(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn init_tracing() {
    // Logs go to stderr so reports on stdout stay pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "store_sales=info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn handle_run(args: RunArgs) -> Result<()> {
    let config = pipeline_config_from_args(&args);
    let output = pipeline::run(&config)?;

    println!("{}", format_run_summary(&output.summary));
    println!("Written:");
    for path in &output.written {
        println!("- {}", path.display());
    }
    Ok(())
}

fn handle_profile(args: DataArgs) -> Result<()> {
    let raw = load_datasets(&args.data_dir)?;
    for table in [&raw.train, &raw.test, &raw.store] {
        println!("{}", format_profile(&profile_missing(table)));
        println!("{}", format_describe(table.name(), &describe(table)?));
    }
    Ok(())
}

fn handle_explore(args: ExploreArgs) -> Result<()> {
    let ws = pipeline::prepare_from_dir(&args.data.data_dir, &builtin_flag_defaults())?;
    let train = &ws.train;

    println!("{}", format_correlation(&correlation_matrix(train, &CORRELATION_COLUMNS)?));

    for by in [YEAR, MONTH, STATE_HOLIDAY, DAY_OF_WEEK, STORE_TYPE] {
        let rows: Vec<(String, f64)> = group_means(train, by, SALES)?
            .into_iter()
            .map(|g| (g.key.to_string(), g.mean))
            .collect();
        println!(
            "{}",
            crate::plot::render_bars(&format!("Mean {SALES} by {by}"), &rows, args.width)
        );
    }

    let open = filter_equals(train, OPEN, 1.0)?;
    let sales: Vec<f64> = open.f64_values(SALES)?.into_iter().flatten().collect();
    println!(
        "{}",
        crate::plot::render_histogram("Sales histogram (open stores)", &sales, args.bins, args.width)
    );

    let points: Vec<(f64, f64)> = open
        .f64_values(CUSTOMERS)?
        .into_iter()
        .zip(open.f64_values(SALES)?)
        .filter_map(|(c, s)| Some((c?, s?)))
        .collect();
    println!(
        "{}",
        crate::plot::render_scatter("Sales vs Customers", &points, trend_line(&points), args.width, 20)
    );
    Ok(())
}

/// Least-squares `(intercept, slope)` through the points.
fn trend_line(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }
    let x = nalgebra::DMatrix::from_iterator(points.len(), 1, points.iter().map(|p| p.0));
    let y = nalgebra::DVector::from_iterator(points.len(), points.iter().map(|p| p.1));
    let beta = solve_least_squares(&with_intercept(&x), &y)?;
    Some((beta[0], beta[1]))
}

fn handle_generate(args: GenerateArgs) -> Result<()> {
    let config = SampleConfig {
        stores: args.stores,
        days: args.days,
        test_days: args.test_days,
        seed: args.seed,
        ..SampleConfig::default()
    };
    let data = write_dataset(&args.out_dir, &config)?;
    println!(
        "Wrote {} train, {} test and {} store rows to {}",
        data.train.height(),
        data.test.height(),
        data.store.height(),
        args.out_dir.display()
    );
    Ok(())
}

pub fn pipeline_config_from_args(args: &RunArgs) -> PipelineConfig {
    PipelineConfig {
        data_dir: args.data.data_dir.clone(),
        out_dir: args.out_dir.clone(),
        seed: args.seed,
        test_size: args.test_size,
        flag_defaults: merge_flag_defaults(&args.flag_defaults),
        model_spec: args.model,
        models: ModelParams {
            tree: TreeParams {
                max_depth: Some(args.tree_depth),
                ..TreeParams::default()
            },
            forest: ForestParams {
                n_trees: args.forest_trees,
                tree: TreeParams {
                    max_depth: Some(args.forest_depth),
                    max_features: args.forest_max_features,
                    ..TreeParams::default()
                },
            },
            boosting: BoostingParams {
                n_estimators: args.boosting_rounds,
                learning_rate: args.learning_rate,
                max_depth: args.boosting_depth,
                subsample: args.subsample,
            },
        },
        export_joined: !args.no_joined,
        export_summary: args.summary.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::FlagDefault;

    #[test]
    fn run_args_map_onto_config() {
        let cli = Cli::try_parse_from([
            "sales",
            "run",
            "--forest-trees",
            "5",
            "--learning-rate",
            "0.2",
            "--no-joined",
            "--summary",
            "s.json",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = pipeline_config_from_args(&args);
        assert_eq!(config.models.forest.n_trees, 5);
        assert_eq!(config.models.forest.tree.max_depth, Some(14));
        assert_eq!(config.models.boosting.learning_rate, 0.2);
        assert!(!config.export_joined);
        assert_eq!(config.export_summary, Some("s.json".into()));
        assert_eq!(config.flag_defaults, builtin_flag_defaults());
    }

    #[test]
    fn user_flag_defaults_extend_the_open_default() {
        let cli = Cli::try_parse_from([
            "sales",
            "run",
            "--flag-default",
            "Promo=0",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        let config = pipeline_config_from_args(&args);
        assert_eq!(
            config.flag_defaults,
            vec![FlagDefault::new("Open", 1), FlagDefault::new("Promo", 0)]
        );
    }

    #[test]
    fn user_open_default_replaces_the_builtin_value() {
        let merged = merge_flag_defaults(&[
            FlagDefault::new("Promo", 0),
            FlagDefault::new("Open", 0),
        ]);
        assert_eq!(
            merged,
            vec![FlagDefault::new("Open", 0), FlagDefault::new("Promo", 0)]
        );
    }

    #[test]
    fn trend_line_recovers_slope() {
        let (a, b) = trend_line(&[(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)]).unwrap();
        assert!((a - 1.0).abs() < 1e-9);
        assert!((b - 2.0).abs() < 1e-9);
        assert_eq!(trend_line(&[(0.0, 1.0)]), None);
    }
}
