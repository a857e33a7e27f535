//! Data sources beyond the input CSVs.

pub mod sample;

pub use sample::*;
