//! Input/output helpers.
//!
//! - CSV ingest with schema checks (`ingest`)
//! - CSV exports for joined tables and submissions (`export`)
//! - JSON run summary read/write (`summary`)

pub mod export;
pub mod ingest;
pub mod summary;

pub use export::*;
pub use ingest::*;
pub use summary::*;
