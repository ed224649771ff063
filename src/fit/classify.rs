//! Threshold classification of query points against selected candidates.
//!
//! For a query point `(x, y)` and every distinct candidate `c` in the match table:
//!
//! - look up every stored `c(x)` at exactly `x` (no interpolation)
//! - `deviation = |y - c(x)|`
//! - feasible iff `deviation <= tolerance_factor * max_deviation(c)`
//!
//! The smallest feasible deviation wins; ties keep the first one encountered in
//! match-table order. Points with no feasible candidate are recorded as
//! unmatched, never raised as errors.

use log::info;
use rayon::prelude::*;

use crate::domain::{CandidateTolerance, Classification, CurveTable, MatchTable, QueryPoint};
use crate::error::MatchError;

/// A candidate resolved against the candidate table, ready for lookups.
#[derive(Debug, Clone, Copy)]
struct Bound {
    tolerance: CandidateTolerance,
    column: usize,
    limit: f64,
}

/// Classify every query point; output has one record per input, in input order.
pub fn classify(
    points: &[QueryPoint],
    matches: &MatchTable,
    candidates: &CurveTable,
    tolerance_factor: f64,
) -> Result<Vec<Classification>, MatchError> {
    if !(tolerance_factor.is_finite() && tolerance_factor >= 0.0) {
        return Err(MatchError::InvalidTolerance(tolerance_factor));
    }
    if matches.is_empty() {
        return Err(MatchError::MissingMatchTable);
    }
    if candidates.is_empty() {
        return Err(MatchError::EmptyInput("no candidate curves"));
    }

    let bounds = matches
        .candidate_tolerances()
        .into_iter()
        .map(|tolerance| -> Result<Bound, MatchError> {
            let column = candidates
                .position(tolerance.candidate)
                .ok_or(MatchError::UnknownCandidate(tolerance.candidate))?;
            Ok(Bound {
                tolerance,
                column,
                limit: tolerance_factor * tolerance.max_deviation,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let out: Vec<Classification> = points
        .par_iter()
        .map(|&p| classify_point(p, &bounds, candidates))
        .collect();

    let matched = out.iter().filter(|c| c.is_matched()).count();
    info!(
        "classified {} points: {matched} matched, {} unmatched (tolerance factor {tolerance_factor:.4})",
        out.len(),
        out.len() - matched
    );

    Ok(out)
}

fn classify_point(p: QueryPoint, bounds: &[Bound], candidates: &CurveTable) -> Classification {
    let mut best = Classification::unmatched(p);

    for b in bounds {
        for candidate_y in candidates.values_at(b.column, p.x) {
            let deviation = (p.y - candidate_y).abs();
            if deviation <= b.limit && deviation < best.deviation {
                best.deviation = deviation;
                best.candidate = Some(b.tolerance.candidate);
                best.matched_y = Some(candidate_y);
            }
        }
    }

    best
}

/// Matched and unmatched views over a classification run.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub matched: Vec<Classification>,
    pub unmatched: Vec<Classification>,
}

/// Split classifications into matched / unmatched, preserving order.
pub fn partition(results: &[Classification]) -> Partition {
    let (matched, unmatched): (Vec<Classification>, Vec<Classification>) =
        results.iter().copied().partition(|c| c.is_matched());
    Partition { matched, unmatched }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveId, DEFAULT_TOLERANCE_FACTOR, MatchRecord};

    fn record(series: u32, candidate: u32, max_deviation: f64) -> MatchRecord {
        MatchRecord {
            series: CurveId(series),
            candidate: CurveId(candidate),
            sse: 0.0,
            max_deviation,
        }
    }

    fn candidates() -> CurveTable {
        CurveTable::new(
            vec![1.0, 2.0, 3.0],
            vec![
                (CurveId(1), vec![1.0, 2.0, 3.0]),
                (CurveId(2), vec![0.0, 0.0, 0.0]),
                (CurveId(3), vec![1.0, 2.02, 3.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn point_within_tolerance_matches_closest_candidate() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1)]);
        let out = classify(
            &[QueryPoint { x: 2.0, y: 2.05 }],
            &matches,
            &candidates(),
            DEFAULT_TOLERANCE_FACTOR,
        )
        .unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].candidate, Some(CurveId(1)));
        assert_eq!(out[0].matched_y, Some(2.0));
        assert!((out[0].deviation - 0.05).abs() < 1e-12);
    }

    #[test]
    fn point_outside_tolerance_is_unmatched_with_infinite_deviation() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1)]);
        let out = classify(
            &[QueryPoint { x: 2.0, y: 2.5 }],
            &matches,
            &candidates(),
            DEFAULT_TOLERANCE_FACTOR,
        )
        .unwrap();

        assert!(!out[0].is_matched());
        assert_eq!(out[0].deviation, f64::INFINITY);
        assert_eq!(out[0].matched_y, None);
    }

    #[test]
    fn off_grid_points_never_match() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1), record(2, 2, 10.0)]);
        let points = [QueryPoint { x: 2.5, y: 2.5 }, QueryPoint { x: 0.0, y: 0.0 }];
        let out = classify(&points, &matches, &candidates(), 1.0e6).unwrap();
        assert!(out.iter().all(|c| !c.is_matched()));
    }

    #[test]
    fn smallest_feasible_deviation_wins_across_candidates() {
        let matches = MatchTable::new(vec![record(1, 1, 1.0), record(2, 3, 1.0)]);
        let out = classify(&[QueryPoint { x: 2.0, y: 2.03 }], &matches, &candidates(), 1.0).unwrap();
        assert_eq!(out[0].candidate, Some(CurveId(3)));
        assert_eq!(out[0].matched_y, Some(2.02));
    }

    #[test]
    fn tolerance_is_per_candidate_not_global() {
        // y2 sits closer to the point but its tolerance is tiny.
        let matches = MatchTable::new(vec![record(1, 1, 2.0), record(2, 2, 0.01)]);
        let out = classify(&[QueryPoint { x: 2.0, y: 0.9 }], &matches, &candidates(), 1.0).unwrap();
        assert_eq!(out[0].candidate, Some(CurveId(1)));
    }

    #[test]
    fn ties_keep_match_table_order() {
        // Point is equidistant from y1 (2.0) and y2 (0.0) at x = 2.
        let matches = MatchTable::new(vec![record(1, 2, 5.0), record(2, 1, 5.0)]);
        let out = classify(&[QueryPoint { x: 2.0, y: 1.0 }], &matches, &candidates(), 1.0).unwrap();
        assert_eq!(out[0].candidate, Some(CurveId(2)));
    }

    #[test]
    fn shared_candidate_uses_largest_series_deviation() {
        let matches = MatchTable::new(vec![record(1, 1, 0.01), record(2, 1, 0.5)]);
        let out = classify(&[QueryPoint { x: 3.0, y: 3.4 }], &matches, &candidates(), 1.0).unwrap();
        assert_eq!(out[0].candidate, Some(CurveId(1)));
    }

    #[test]
    fn duplicate_grid_values_are_all_considered() {
        let table = CurveTable::new(
            vec![1.0, 2.0, 2.0],
            vec![(CurveId(1), vec![1.0, 5.0, 2.1])],
        )
        .unwrap();
        let matches = MatchTable::new(vec![record(1, 1, 0.2)]);
        let out = classify(&[QueryPoint { x: 2.0, y: 2.0 }], &matches, &table, 1.0).unwrap();
        assert_eq!(out[0].matched_y, Some(2.1));
    }

    #[test]
    fn ten_points_six_matched_four_unmatched() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1)]);
        let mut points = Vec::new();
        for i in 0..6 {
            let x = [1.0, 2.0, 3.0][i % 3];
            points.push(QueryPoint { x, y: x + 0.01 * i as f64 });
        }
        points.push(QueryPoint { x: 1.0, y: 9.0 });
        points.push(QueryPoint { x: 2.0, y: -4.0 });
        points.push(QueryPoint { x: 7.0, y: 7.0 });
        points.push(QueryPoint { x: 3.0, y: 3.5 });

        let out = classify(&points, &matches, &candidates(), DEFAULT_TOLERANCE_FACTOR).unwrap();
        let parts = partition(&out);
        assert_eq!(out.len(), 10);
        assert_eq!(parts.matched.len(), 6);
        assert_eq!(parts.unmatched.len(), 4);
        assert_eq!(parts.matched.len() + parts.unmatched.len(), points.len());
    }

    #[test]
    fn matched_count_is_monotonic_in_tolerance() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1), record(2, 3, 0.05)]);
        let points: Vec<QueryPoint> = (0..30)
            .map(|i| {
                let x = [1.0, 2.0, 3.0][i % 3];
                QueryPoint { x, y: x + (i as f64 - 15.0) * 0.02 }
            })
            .collect();

        let mut last = 0;
        for factor in [0.0, 0.5, 1.0, DEFAULT_TOLERANCE_FACTOR, 2.0, 5.0, 50.0] {
            let out = classify(&points, &matches, &candidates(), factor).unwrap();
            let n = out.iter().filter(|c| c.is_matched()).count();
            assert!(n >= last, "factor {factor}: {n} < {last}");
            last = n;
        }
    }

    #[test]
    fn reclassification_is_idempotent() {
        let matches = MatchTable::new(vec![record(1, 1, 0.1), record(2, 2, 0.3)]);
        let points = [
            QueryPoint { x: 1.0, y: 1.05 },
            QueryPoint { x: 2.0, y: 0.2 },
            QueryPoint { x: 3.0, y: 1.5 },
        ];
        let a = classify(&points, &matches, &candidates(), DEFAULT_TOLERANCE_FACTOR).unwrap();
        let b = classify(&points, &matches, &candidates(), DEFAULT_TOLERANCE_FACTOR).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn structural_errors_fail_the_whole_pass() {
        let points = [QueryPoint { x: 1.0, y: 1.0 }];
        assert_eq!(
            classify(&points, &MatchTable::default(), &candidates(), 1.0),
            Err(MatchError::MissingMatchTable)
        );

        let matches = MatchTable::new(vec![record(1, 42, 0.1)]);
        assert_eq!(
            classify(&points, &matches, &candidates(), 1.0),
            Err(MatchError::UnknownCandidate(CurveId(42)))
        );

        let matches = MatchTable::new(vec![record(1, 1, 0.1)]);
        assert!(matches!(
            classify(&points, &matches, &candidates(), -1.0),
            Err(MatchError::InvalidTolerance(_))
        ));

        let empty = CurveTable::new(vec![1.0], Vec::new()).unwrap();
        assert!(matches!(
            classify(&points, &matches, &empty, 1.0),
            Err(MatchError::EmptyInput(_))
        ));
    }
}
