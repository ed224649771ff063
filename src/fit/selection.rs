//! Best-candidate selection by sum of squared errors.
//!
//! For every training series `t` and every candidate `c` sampled on the same grid:
//!
//! ```text
//! SSE(t, c) = Σ_x (t[x] - c[x])²
//! ```
//!
//! Selection rules:
//! 1. Both tables must share an identical grid (no broadcasting/truncation).
//! 2. Choose the candidate with strictly smallest SSE.
//! 3. Ties go to the first candidate in ascending id order.
//!
//! Series are independent, so they are evaluated in parallel; the indexed
//! collect keeps output order (and therefore results) identical to a
//! sequential pass.

use log::debug;
use rayon::prelude::*;

use crate::domain::{CurveTable, SeriesSelection};
use crate::error::MatchError;

/// Select the best-fitting candidate for each training series.
///
/// Output is ordered like `training.ids()`.
pub fn select_best_matches(
    training: &CurveTable,
    candidates: &CurveTable,
) -> Result<Vec<SeriesSelection>, MatchError> {
    if training.is_empty() {
        return Err(MatchError::EmptyInput("no training series"));
    }
    if candidates.is_empty() {
        return Err(MatchError::EmptyInput("no candidate curves"));
    }
    training.grid().ensure_same(candidates.grid())?;

    let selections: Vec<SeriesSelection> = (0..training.len())
        .into_par_iter()
        .map(|s| select_for_series(training, s, candidates))
        .collect();

    for sel in &selections {
        debug!("series {} -> candidate {} (SSE={:.6})", sel.series, sel.candidate, sel.sse);
    }

    Ok(selections)
}

fn select_for_series(training: &CurveTable, s: usize, candidates: &CurveTable) -> SeriesSelection {
    let series = training.values().column(s);

    let mut best_idx = 0;
    let mut best_sse = f64::INFINITY;
    for c in 0..candidates.len() {
        let sse = (&series - &candidates.values().column(c)).norm_squared();
        // Strict `<` keeps the first-seen candidate on ties.
        if sse < best_sse {
            best_sse = sse;
            best_idx = c;
        }
    }

    SeriesSelection {
        series: training.ids()[s],
        candidate: candidates.ids()[best_idx],
        sse: best_sse,
    }
}
