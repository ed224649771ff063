//! Curve matching and point classification.
//!
//! Responsibilities:
//!
//! - select the best candidate per training series by SSE (parallel over series)
//! - recompute max deviation for every selected pair
//! - classify query points against the selected candidates (parallel over points)

pub mod classify;
pub mod deviation;
pub mod selection;

pub use classify::*;
pub use deviation::*;
pub use selection::*;
