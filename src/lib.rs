//! `ideal-match` library crate.
//!
//! Picks, for each noisy training series, the closest ideal function by SSE and
//! then classifies test points against the picked functions using a tolerance
//! derived from the training fit.
//!
//! The binary (`ideal-match`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the matching core can be used without any file I/O

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod plot;
pub mod report;

pub use domain::{
    Classification, CurveId, CurveTable, DEFAULT_TOLERANCE_FACTOR, MatchRecord, MatchTable, QueryPoint,
};
pub use error::{AppError, MatchError};
pub use fit::{build_match_table, classify, max_deviation, select_best_matches};
