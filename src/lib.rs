//! `store-sales` library crate.
//!
//! The binary (`sales`) is a thin wrapper around this library so that:
//!
//! - the cleaning pipeline is testable without spawning processes
//! - stages and models are reusable on their own
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod prep;
pub mod report;
pub mod table;
