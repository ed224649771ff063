//! Max-deviation bounds for selected series/candidate pairs.
//!
//! Selection ranks candidates by SSE; classification needs a different quantity,
//! the largest absolute pointwise error over the *entire* training series. It is
//! recomputed from the raw columns after selection so a single outlier point is
//! never averaged away.

use log::debug;
use nalgebra::DVector;

use crate::domain::{CurveTable, MatchRecord, MatchTable, SeriesSelection};
use crate::error::MatchError;

/// `max_x |t[x] - c[x]|` for two curves sampled on the same grid.
pub fn max_deviation(series: &[f64], candidate: &[f64]) -> Result<f64, MatchError> {
    if series.len() != candidate.len() {
        return Err(MatchError::ShapeMismatch(format!(
            "curve lengths differ ({} vs {})",
            series.len(),
            candidate.len()
        )));
    }
    if series.is_empty() {
        return Err(MatchError::EmptyInput("curves have no samples"));
    }

    let residual = DVector::from_column_slice(series) - DVector::from_column_slice(candidate);
    Ok(residual.amax())
}

/// Attach max deviations to a selection, producing the match table consumed by
/// classification.
pub fn build_match_table(
    training: &CurveTable,
    candidates: &CurveTable,
    selections: &[SeriesSelection],
) -> Result<MatchTable, MatchError> {
    training.grid().ensure_same(candidates.grid())?;

    let mut records = Vec::with_capacity(selections.len());
    for sel in selections {
        let series = training
            .curve(sel.series)
            .ok_or(MatchError::EmptyInput("selection references a missing training series"))?;
        let candidate = candidates
            .curve(sel.candidate)
            .ok_or(MatchError::UnknownCandidate(sel.candidate))?;

        let max_deviation = max_deviation(series, candidate)?;
        debug!("{} ~ {}: max deviation {max_deviation:.6}", sel.series, sel.candidate);

        records.push(MatchRecord {
            series: sel.series,
            candidate: sel.candidate,
            sse: sel.sse,
            max_deviation,
        });
    }

    Ok(MatchTable::new(records))
}
