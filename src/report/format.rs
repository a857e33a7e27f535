//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the cleaning/modeling code stays free of presentation
//! - output changes are localized

use crate::domain::RunSummary;
use crate::prep::MissingProfile;
use crate::report::{ColumnStats, CorrelationMatrix};

/// Missing counts per column, most-missing first.
pub fn format_profile(profile: &MissingProfile) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "NaNs for individual columns ({}, {} rows)\n",
        profile.table, profile.rows
    ));
    out.push_str(&format!("{:-<40}\n", ""));
    for (column, count) in &profile.counts {
        out.push_str(&format!("{:<28} {:>11}\n", truncate(column, 28), count));
    }
    out
}

pub fn format_describe(table: &str, stats: &[ColumnStats]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Summary statistics ({table}):\n"));
    out.push_str(
        format!(
            "{:<26} {:>8} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "missing", "mean", "std", "min", "25%", "50%", "75%", "max"
        )
        .trim_end(),
    );
    out.push('\n');
    for s in stats {
        out.push_str(
            format!(
                "{:<26} {:>8} {:>8} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                truncate(&s.column, 26),
                s.count,
                s.missing,
                fmt_opt(s.mean),
                fmt_opt(s.std),
                fmt_opt(s.min),
                fmt_opt(s.p25),
                fmt_opt(s.median),
                fmt_opt(s.p75),
                fmt_opt(s.max),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub fn format_correlation(matrix: &CorrelationMatrix) -> String {
    let mut out = String::new();
    out.push_str("Correlation matrix:\n");
    out.push_str(&format!("{:<14}", ""));
    for c in &matrix.columns {
        out.push_str(&format!(" {:>13}", truncate(c, 13)));
    }
    out.push('\n');
    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        out.push_str(&format!("{:<14}", truncate(name, 14)));
        for v in row {
            let cell = v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
            out.push_str(&format!(" {cell:>13}"));
        }
        out.push('\n');
    }
    out
}

pub fn format_run_summary(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", summary.tool));
    let r = &summary.rows;
    out.push_str(&format!(
        "Loaded: train={} test={} store={}\n",
        r.train_loaded, r.test_loaded, r.store_loaded
    ));
    out.push_str(&format!(
        "Joined: train={} test={} (dropped {} StateHoliday rows)\n",
        r.train_joined, r.test_joined, summary.dropped_state_holiday
    ));
    out.push_str(&format!(
        "Model rows: fit={} holdout={} test(open)={} | seed={} test_size={}\n",
        r.train_fit, r.holdout, r.test_predicted, summary.seed, summary.test_size
    ));

    if !summary.flag_fills.is_empty() {
        out.push_str("\nFlag defaults:\n");
        for (table, column, filled) in &summary.flag_fills {
            out.push_str(&format!("- {table}.{column}: {filled} filled\n"));
        }
    }
    if !summary.imputations.is_empty() {
        out.push_str("\nMean imputation:\n");
        for rec in &summary.imputations {
            out.push_str(&format!(
                "- {}.{}: {} filled with {:.4}\n",
                rec.table, rec.column, rec.filled, rec.mean
            ));
        }
    }
    if !summary.encodings.is_empty() {
        out.push_str("\nCategory codes:\n");
        for enc in &summary.encodings {
            let pairs: Vec<String> = enc
                .labels
                .iter()
                .enumerate()
                .map(|(i, l)| format!("{l}={}", enc.offset + i as i64))
                .collect();
            out.push_str(&format!("- {}: {}\n", enc.column, pairs.join(", ")));
        }
    }

    out.push_str("\nModels (holdout):\n");
    out.push_str(&format!("{:<28} {:>10} {:>14}  {}\n", "model", "R2", "RMSE", "submission"));
    for m in &summary.models {
        out.push_str(&format!(
            "{:<28} {:>10.4} {:>14.2}  {}\n",
            m.model.display_name(),
            m.holdout_r2,
            m.holdout_rmse,
            m.submission
        ));
    }
    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.3}"))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
