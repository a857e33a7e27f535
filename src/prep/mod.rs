//! Cleaning and feature preparation.
//!
//! Each submodule is one reusable transform over `Table`s:
//!
//! - `calendar`: Year/Month from Date
//! - `encoder`: categorical labels to integer codes (shared maps)
//! - `impute`: flag defaults, mean imputation, missing-value profiles
//! - `promo`: promotion-window and scale-reversal transforms
//! - `filter`: domain restriction and equality filters
//! - `join`: left join on the store id
//! - `split`: seeded train/holdout partition
//! - `scale`: z-score standardization fitted on training rows

pub mod calendar;
pub mod encoder;
pub mod filter;
pub mod impute;
pub mod join;
pub mod promo;
pub mod scale;
pub mod split;

pub use calendar::*;
pub use encoder::*;
pub use filter::*;
pub use impute::*;
pub use join::*;
pub use promo::*;
pub use scale::*;
pub use split::*;
