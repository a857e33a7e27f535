//! In-memory tabular data.
//!
//! Each named dataset (train, test, store) is a polars `DataFrame` wrapped in
//! a `Table` that carries its name for error reporting. Tables are handed
//! from stage to stage by value; transforms replace columns in place.

pub mod frame;

pub use frame::*;
