//! Categorical encoding: string labels to dense integer codes.
//!
//! Codes are assigned in order of first appearance, starting at a configurable
//! offset. A `CategoryMap` is built once (on the training partition) and reused
//! for every other partition so the same label always gets the same code.

use std::collections::HashMap;

use polars::prelude::*;
use tracing::{debug, warn};

use crate::domain::EncodingSummary;
use crate::error::{AppError, Result};
use crate::table::{Table, is_numeric_dtype};

/// What to do with a label the map has not seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Assign the next free code (used while fitting).
    Extend,
    /// Fail with `UnknownCategory` (used at inference).
    Reject,
}

/// Bidirectional label <-> code mapping for one column.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMap {
    column: String,
    offset: i64,
    labels: Vec<String>,
    codes: HashMap<String, i64>,
}

impl CategoryMap {
    pub fn new(column: impl Into<String>, offset: i64) -> Self {
        Self {
            column: column.into(),
            offset,
            labels: Vec::new(),
            codes: HashMap::new(),
        }
    }

    /// A map with a fixed level order (first level gets `offset`).
    pub fn with_levels(column: impl Into<String>, offset: i64, levels: &[&str]) -> Self {
        let mut map = Self::new(column, offset);
        for level in levels {
            map.insert(level);
        }
        map
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Labels in code order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn code(&self, label: &str) -> Option<i64> {
        self.codes.get(label).copied()
    }

    pub fn label(&self, code: i64) -> Option<&str> {
        let idx = usize::try_from(code - self.offset).ok()?;
        self.labels.get(idx).map(String::as_str)
    }

    fn insert(&mut self, label: &str) -> i64 {
        if let Some(code) = self.codes.get(label) {
            return *code;
        }
        let code = self.offset + self.labels.len() as i64;
        self.labels.push(label.to_string());
        self.codes.insert(label.to_string(), code);
        code
    }

    fn resolve(&mut self, label: &str, policy: UnknownPolicy) -> Result<i64> {
        match (self.code(label), policy) {
            (Some(code), _) => Ok(code),
            (None, UnknownPolicy::Extend) => Ok(self.insert(label)),
            (None, UnknownPolicy::Reject) => Err(AppError::UnknownCategory {
                column: self.column.clone(),
                value: label.to_string(),
            }),
        }
    }

    pub fn summary(&self) -> EncodingSummary {
        EncodingSummary {
            column: self.column.clone(),
            offset: self.offset,
            labels: self.labels.clone(),
        }
    }
}

/// Result of encoding one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The column was converted; `levels` is the map size afterwards.
    Encoded { levels: usize },
    /// The column was already numeric; nothing changed.
    AlreadyEncoded,
}

/// Encode `column` of `table` in place through `map`.
///
/// Missing values stay missing. A numeric column (integer or float) counts as
/// already encoded and is left untouched; any other non-string column is a
/// type error.
pub fn encode_column(
    table: &mut Table,
    column: &str,
    map: &mut CategoryMap,
    policy: UnknownPolicy,
) -> Result<EncodeOutcome> {
    let dtype = table.dtype(column)?;
    if is_numeric_dtype(&dtype) {
        debug!(table = table.name(), column, %dtype, "already encoded, skipping");
        return Ok(EncodeOutcome::AlreadyEncoded);
    }
    if dtype != DataType::String {
        return Err(AppError::TypeMismatch {
            column: column.to_string(),
            expected: "categorical".to_string(),
            actual: dtype.to_string(),
        });
    }

    let labels = table.series(column)?.str()?;
    let mut codes = Vec::with_capacity(labels.len());
    for label in labels.into_iter() {
        let code = match label {
            Some(label) => Some(map.resolve(label, policy)?),
            None => None,
        };
        codes.push(code);
    }

    let missing = codes.iter().filter(|c| c.is_none()).count();
    if missing > 0 {
        warn!(table = table.name(), column, missing, "missing labels left unencoded");
    }

    table.put(column, Series::new(column.into(), codes))?;
    debug!(table = table.name(), column, levels = map.len(), "encoded");
    Ok(EncodeOutcome::Encoded { levels: map.len() })
}

/// One-shot encoding with a fresh map starting at `start_value`.
pub fn categorical_to_numerical(
    table: &mut Table,
    column: &str,
    start_value: i64,
) -> Result<CategoryMap> {
    let mut map = CategoryMap::new(column, start_value);
    encode_column(table, column, &mut map, UnknownPolicy::Extend)?;
    Ok(map)
}

/// The category maps of every encoded column, shared across partitions.
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    maps: Vec<CategoryMap>,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pre-seeded map (e.g. a fixed level order).
    pub fn seed(&mut self, map: CategoryMap) {
        match self.maps.iter_mut().find(|m| m.column == map.column) {
            Some(existing) => *existing = map,
            None => self.maps.push(map),
        }
    }

    pub fn map(&self, column: &str) -> Option<&CategoryMap> {
        self.maps.iter().find(|m| m.column == column)
    }

    pub fn maps(&self) -> &[CategoryMap] {
        &self.maps
    }

    fn map_mut(&mut self, column: &str, offset: i64) -> &mut CategoryMap {
        let idx = match self.maps.iter().position(|m| m.column == column) {
            Some(idx) => idx,
            None => {
                self.maps.push(CategoryMap::new(column, offset));
                self.maps.len() - 1
            }
        };
        &mut self.maps[idx]
    }

    /// Encode columns, growing their maps with unseen labels.
    pub fn fit_transform(&mut self, table: &mut Table, columns: &[&str], offset: i64) -> Result<()> {
        for column in columns {
            let map = self.map_mut(column, offset);
            encode_column(table, column, map, UnknownPolicy::Extend)?;
        }
        Ok(())
    }

    /// Encode columns with the existing maps; unseen labels are an error.
    pub fn transform(&self, table: &mut Table, columns: &[&str]) -> Result<()> {
        for column in columns {
            let mut map = self
                .map(column)
                .cloned()
                .ok_or_else(|| AppError::Config(format!("no category map fitted for `{column}`")))?;
            encode_column(table, column, &mut map, UnknownPolicy::Reject)?;
        }
        Ok(())
    }
}
