//! Shared pipeline logic used by the `run` and `explore` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> calendar -> encode -> impute -> promo window -> join -> model data -> fit
//!
//! The cleaning half is split into explicit [`Stage`]s that run in
//! [`Stage::ORDER`] against a [`Workspace`] of owned tables. Front-ends can
//! stop after [`prepare`] (exploration) or continue through [`run`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::domain::schema::{
    ASSORTMENT, COMPETITION_OPEN_SINCE_MONTH, COMPETITION_OPEN_SINCE_YEAR, DATE, PROMO_INTERVAL,
    PROMO2, PROMO2_SINCE_WEEK, PROMO2_SINCE_YEAR, SCHOOL_HOLIDAY, STATE_HOLIDAY,
    STATE_HOLIDAY_LEVELS, STORE, STORE_TYPE, TEST_ORDER, TRAIN_ORDER,
};
use crate::domain::{
    FlagDefault, ImputationRecord, ModelScore, PipelineConfig, RowCounts, RunSummary,
};
use crate::error::{AppError, Result};
use crate::fit::{ModelData, ModelOutcome, build_model_data, fit_models};
use crate::io::{RawData, load_datasets, write_predictions_csv, write_run_summary_json, write_table_csv};
use crate::prep::{
    CategoryMap, Encoder, KeyCoverage, apply_promo_window, derive_year_month, fill_flag_default,
    impute_numeric_means, key_coverage, left_join, profile_missing, restrict_to_domain,
    reverse_scale,
};
use crate::table::Table;

pub const TRAIN_STORE_FILE: &str = "train_store.csv";
pub const TEST_STORE_FILE: &str = "test_store.csv";

/// One cleaning step. Stages always run in [`Stage::ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Year/Month from Date; canonical column order.
    DeriveCalendar,
    /// StateHoliday (fixed levels) and SchoolHoliday on train, reused for test.
    EncodeRecords,
    /// Domain constants for missing flags (e.g. `Open = 1`).
    FlagDefaults,
    /// Drop training rows whose StateHoliday code never occurs in test.
    RestrictStateHoliday,
    /// Promo2 window on store attributes, before any imputation.
    PromoWindow,
    /// PromoInterval, StoreType, Assortment.
    EncodeStore,
    ImputeStore,
    CompetitionReversal,
    JoinStore,
    /// Fill attributes of stores missing from the store table.
    ImputeJoined,
}

impl Stage {
    pub const ORDER: [Stage; 10] = [
        Stage::DeriveCalendar,
        Stage::EncodeRecords,
        Stage::FlagDefaults,
        Stage::RestrictStateHoliday,
        Stage::PromoWindow,
        Stage::EncodeStore,
        Stage::ImputeStore,
        Stage::CompetitionReversal,
        Stage::JoinStore,
        Stage::ImputeJoined,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Stage::DeriveCalendar => "derive-calendar",
            Stage::EncodeRecords => "encode-records",
            Stage::FlagDefaults => "flag-defaults",
            Stage::RestrictStateHoliday => "restrict-state-holiday",
            Stage::PromoWindow => "promo-window",
            Stage::EncodeStore => "encode-store",
            Stage::ImputeStore => "impute-store",
            Stage::CompetitionReversal => "competition-reversal",
            Stage::JoinStore => "join-store",
            Stage::ImputeJoined => "impute-joined",
        }
    }
}

/// What the cleaning stages changed, for reporting.
#[derive(Debug, Clone, Default)]
pub struct PrepReport {
    /// `(table, column, filled)` per applied flag default.
    pub flag_fills: Vec<(String, String, usize)>,
    pub dropped_state_holiday: usize,
    pub imputations: Vec<ImputationRecord>,
    pub coverage: Option<KeyCoverage>,
}

/// Tables and fitted encoders threaded through the stages.
///
/// After [`Stage::JoinStore`], `train` and `test` hold the joined tables.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub train: Table,
    pub test: Table,
    pub store: Table,
    pub encoder: Encoder,
    pub report: PrepReport,
}

impl Workspace {
    pub fn new(raw: RawData) -> Self {
        Self {
            train: raw.train,
            test: raw.test,
            store: raw.store,
            encoder: Encoder::new(),
            report: PrepReport::default(),
        }
    }

    pub fn apply(&mut self, stage: Stage, flag_defaults: &[FlagDefault]) -> Result<()> {
        match stage {
            Stage::DeriveCalendar => {
                derive_year_month(&mut self.train, DATE)?;
                derive_year_month(&mut self.test, DATE)?;
                self.train = reorder(&self.train, &TRAIN_ORDER)?;
                self.test = reorder(&self.test, &TEST_ORDER)?;
            }
            Stage::EncodeRecords => {
                self.encoder
                    .seed(CategoryMap::with_levels(STATE_HOLIDAY, 0, &STATE_HOLIDAY_LEVELS));
                let columns = [STATE_HOLIDAY, SCHOOL_HOLIDAY];
                self.encoder.fit_transform(&mut self.train, &columns, 0)?;
                self.encoder.transform(&mut self.test, &columns)?;
            }
            Stage::FlagDefaults => {
                for flag in flag_defaults {
                    self.fill_flag(flag)?;
                }
            }
            Stage::RestrictStateHoliday => {
                let (kept, dropped) = restrict_to_domain(&self.train, &self.test, STATE_HOLIDAY)?;
                if dropped > 0 {
                    warn!(dropped, "training rows with a StateHoliday code absent from test dropped");
                }
                if kept.height() == 0 {
                    return Err(AppError::EmptyTable(self.train.name().to_string()));
                }
                self.train = kept;
                self.report.dropped_state_holiday = dropped;
            }
            Stage::PromoWindow => {
                apply_promo_window(
                    &mut self.store,
                    PROMO2,
                    &[PROMO2_SINCE_WEEK, PROMO2_SINCE_YEAR],
                    &[PROMO_INTERVAL],
                )?;
            }
            Stage::EncodeStore => {
                self.encoder
                    .fit_transform(&mut self.store, &[PROMO_INTERVAL, STORE_TYPE, ASSORTMENT], 0)?;
            }
            Stage::ImputeStore => {
                let records = impute_numeric_means(&mut self.store)?;
                self.report.imputations.extend(records);
            }
            Stage::CompetitionReversal => {
                for column in [COMPETITION_OPEN_SINCE_MONTH, COMPETITION_OPEN_SINCE_YEAR] {
                    let max = reverse_scale(&mut self.store, column)?;
                    debug!(column, ?max, "reversed");
                }
            }
            Stage::JoinStore => {
                let coverage = key_coverage(&self.train, &self.store, STORE)?;
                if coverage.left_unmatched > 0 || coverage.right_unused > 0 {
                    warn!(
                        train_stores_without_attributes = coverage.left_unmatched,
                        unused_store_rows = coverage.right_unused,
                        "store coverage mismatch"
                    );
                }
                self.report.coverage = Some(coverage);

                self.train = left_join(&self.train, &self.store, STORE)?;
                self.train.set_name("train_store");
                self.test = left_join(&self.test, &self.store, STORE)?;
                self.test.set_name("test_store");
            }
            Stage::ImputeJoined => {
                for table in [&mut self.train, &mut self.test] {
                    let records = impute_numeric_means(table)?;
                    self.report.imputations.extend(records);
                    let profile = profile_missing(table);
                    if !profile.is_clean() {
                        warn!(
                            table = table.name(),
                            missing = profile.total(),
                            "non-numeric columns still have missing values"
                        );
                    }
                }
            }
        }
        Ok(())
    }

    fn fill_flag(&mut self, flag: &FlagDefault) -> Result<()> {
        let mut applied = false;
        for table in [&mut self.train, &mut self.test] {
            if !table.has_column(&flag.column) {
                continue;
            }
            let filled = fill_flag_default(table, &flag.column, flag.value)?;
            if filled > 0 {
                info!(table = table.name(), column = %flag.column, value = flag.value, filled, "flag default applied");
            }
            self.report
                .flag_fills
                .push((table.name().to_string(), flag.column.clone(), filled));
            applied = true;
        }
        if !applied {
            return Err(AppError::Config(format!(
                "flag default for `{}` matches no column of train or test",
                flag.column
            )));
        }
        Ok(())
    }
}

/// Listed columns first (in order), then any others in their current order.
fn reorder(table: &Table, order: &[&str]) -> Result<Table> {
    let existing = table.names();
    let mut names: Vec<&str> = order.to_vec();
    names.extend(
        existing
            .iter()
            .map(String::as_str)
            .filter(|n| !order.contains(n)),
    );
    table.select(&names)
}

/// Run every cleaning stage in order.
pub fn prepare(raw: RawData, flag_defaults: &[FlagDefault]) -> Result<Workspace> {
    let mut ws = Workspace::new(raw);
    for stage in Stage::ORDER {
        debug!(stage = stage.label(), "stage start");
        ws.apply(stage, flag_defaults)?;
        info!(
            stage = stage.label(),
            train = ws.train.height(),
            test = ws.test.height(),
            store = ws.store.height(),
            "stage done"
        );
    }
    Ok(ws)
}

/// Load the inputs from `data_dir` and run every cleaning stage.
pub fn prepare_from_dir(data_dir: &Path, flag_defaults: &[FlagDefault]) -> Result<Workspace> {
    let raw = load_datasets(data_dir)?;
    prepare(raw, flag_defaults)
}

/// All computed outputs of a single `sales run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub workspace: Workspace,
    pub model_data: ModelData,
    pub outcomes: Vec<ModelOutcome>,
    pub summary: RunSummary,
    /// Files written to the output directory.
    pub written: Vec<PathBuf>,
}

/// Execute the full pipeline and write its outputs.
pub fn run(config: &PipelineConfig) -> Result<RunOutput> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(AppError::Config(format!(
            "test size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let raw = load_datasets(&config.data_dir)?;
    let mut rows = RowCounts {
        train_loaded: raw.train.height(),
        test_loaded: raw.test.height(),
        store_loaded: raw.store.height(),
        ..RowCounts::default()
    };

    let workspace = prepare(raw, &config.flag_defaults)?;
    rows.train_joined = workspace.train.height();
    rows.test_joined = workspace.test.height();

    fs::create_dir_all(&config.out_dir).map_err(|e| AppError::io(&config.out_dir, e))?;
    let mut written = Vec::new();
    if config.export_joined {
        for (file, table) in [
            (TRAIN_STORE_FILE, &workspace.train),
            (TEST_STORE_FILE, &workspace.test),
        ] {
            let path = config.out_dir.join(file);
            write_table_csv(&path, table)?;
            written.push(path);
        }
    }

    let model_data = build_model_data(
        &workspace.train,
        &workspace.test,
        config.seed,
        config.test_size,
    )?;
    rows.train_fit = model_data.x_train.nrows();
    rows.holdout = model_data.x_holdout.nrows();
    rows.test_predicted = model_data.x_test.nrows();

    let outcomes = fit_models(
        &model_data,
        &config.model_spec.kinds(),
        &config.models,
        config.seed,
    )?;

    let mut scores = Vec::with_capacity(outcomes.len());
    for outcome in &outcomes {
        let file = outcome.kind.submission_file();
        let path = config.out_dir.join(&file);
        write_predictions_csv(&path, &outcome.predictions)?;
        info!(model = outcome.kind.display_name(), path = %path.display(), "submission written");
        written.push(path);
        scores.push(ModelScore {
            model: outcome.kind,
            holdout_r2: outcome.holdout_r2,
            holdout_rmse: outcome.holdout_rmse,
            submission: file,
        });
    }

    let summary = RunSummary {
        tool: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        generated_at: chrono::Local::now().to_rfc3339(),
        seed: config.seed,
        test_size: config.test_size,
        rows,
        dropped_state_holiday: workspace.report.dropped_state_holiday,
        flag_fills: workspace.report.flag_fills.clone(),
        imputations: workspace.report.imputations.clone(),
        encodings: workspace.encoder.maps().iter().map(CategoryMap::summary).collect(),
        scaler: model_data.scaler.summary(),
        models: scores,
    };
    if let Some(path) = &config.export_summary {
        write_run_summary_json(path, &summary)?;
        written.push(path.clone());
    }

    Ok(RunOutput {
        workspace,
        model_data,
        outcomes,
        summary,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promo_window_runs_before_store_imputation() {
        let order = Stage::ORDER;
        let pos = |s: Stage| order.iter().position(|x| *x == s).unwrap();
        assert!(pos(Stage::PromoWindow) < pos(Stage::ImputeStore));
        assert!(pos(Stage::ImputeStore) < pos(Stage::CompetitionReversal));
        assert!(pos(Stage::EncodeRecords) < pos(Stage::RestrictStateHoliday));
        assert!(pos(Stage::JoinStore) < pos(Stage::ImputeJoined));
    }

    #[test]
    fn stage_labels_are_unique() {
        let mut labels: Vec<&str> = Stage::ORDER.iter().map(|s| s.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Stage::ORDER.len());
    }

    #[test]
    fn reorder_keeps_extra_columns_last() {
        use polars::prelude::{NamedFrom, Series};
        let t = Table::from_series(
            "t",
            vec![
                Series::new("b".into(), &[1i64]),
                Series::new("x".into(), &[2i64]),
                Series::new("a".into(), &[3i64]),
            ],
        )
        .unwrap();
        let r = reorder(&t, &["a", "b"]).unwrap();
        assert_eq!(r.names(), vec!["a", "b", "x"]);
    }
}
