//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - column names and the expected CSV schemas (`schema`)
//! - run configuration (`PipelineConfig`, `ModelSpec`, `FlagDefault`)
//! - serializable run outputs (`RunSummary`)

pub mod schema;
pub mod types;

pub use types::*;
