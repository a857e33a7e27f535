//! Model training.
//!
//! Responsibilities:
//!
//! - build leak-free, scaled feature matrices from the joined tables
//! - fit the requested regressors
//! - score them on the holdout partition and predict the test rows

pub mod trainer;

pub use trainer::*;
