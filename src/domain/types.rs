//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory during selection and classification
//! - exported to JSON/CSV
//! - reloaded later for classification runs against a persisted match table

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// Default multiplier applied to a candidate's max deviation (`√2`).
pub const DEFAULT_TOLERANCE_FACTOR: f64 = std::f64::consts::SQRT_2;

/// Identifier of a curve column (`y1`, `y2`, ...).
///
/// Ordering is numeric, so `y2 < y10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CurveId(pub u32);

impl fmt::Display for CurveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "y{}", self.0)
    }
}

impl FromStr for CurveId {
    type Err = String;

    /// Accepts `y12`, `Y12` or a bare `12`. Ids start at 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s
            .strip_prefix('y')
            .or_else(|| s.strip_prefix('Y'))
            .unwrap_or(s);
        match digits.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(CurveId(n)),
            _ => Err(format!("Invalid curve id '{s}'. Expected `y<N>` with N >= 1.")),
        }
    }
}

impl From<CurveId> for String {
    fn from(id: CurveId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for CurveId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Ordered X coordinates shared by every curve of a table.
///
/// Lookups are by exact equality. A grid may repeat an X value; `positions`
/// then returns every row carrying it.
#[derive(Debug, Clone)]
pub struct Grid {
    xs: Vec<f64>,
    index: HashMap<u64, Vec<usize>>,
}

impl Grid {
    pub fn new(xs: Vec<f64>) -> Self {
        let mut index: HashMap<u64, Vec<usize>> = HashMap::with_capacity(xs.len());
        for (row, &x) in xs.iter().enumerate() {
            index.entry(grid_key(x)).or_default().push(row);
        }
        Self { xs, index }
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Row positions whose X equals `x` exactly (empty when `x` is off-grid).
    pub fn positions(&self, x: f64) -> &[usize] {
        self.index.get(&grid_key(x)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check that `other` has the same length and identical X values.
    pub fn ensure_same(&self, other: &Grid) -> Result<(), MatchError> {
        if self.len() != other.len() {
            return Err(MatchError::ShapeMismatch(format!(
                "grid lengths differ ({} vs {})",
                self.len(),
                other.len()
            )));
        }
        if let Some(row) = self.xs.iter().zip(&other.xs).position(|(a, b)| a != b) {
            return Err(MatchError::ShapeMismatch(format!(
                "x values differ at row {row} ({} vs {})",
                self.xs[row], other.xs[row]
            )));
        }
        Ok(())
    }
}

fn grid_key(x: f64) -> u64 {
    // `-0.0 == 0.0` must hash to the same bucket.
    if x == 0.0 { 0.0f64.to_bits() } else { x.to_bits() }
}

/// A table of curves sampled on one grid.
///
/// Values are stored column-major in a `DMatrix` (rows = grid, columns = curves),
/// with columns ordered by ascending `CurveId`.
#[derive(Debug, Clone)]
pub struct CurveTable {
    grid: Grid,
    ids: Vec<CurveId>,
    values: DMatrix<f64>,
}

impl CurveTable {
    /// Build a table from a grid and `(id, values)` columns in any order.
    pub fn new(xs: Vec<f64>, mut columns: Vec<(CurveId, Vec<f64>)>) -> Result<Self, MatchError> {
        let n_rows = xs.len();
        columns.sort_by_key(|(id, _)| *id);

        if let Some(w) = columns.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(MatchError::ShapeMismatch(format!("duplicate curve id {}", w[0].0)));
        }
        if let Some((id, col)) = columns.iter().find(|(_, col)| col.len() != n_rows) {
            return Err(MatchError::ShapeMismatch(format!(
                "curve {id} has {} values for a grid of {n_rows} rows",
                col.len()
            )));
        }
        if let Some(row) = xs.iter().position(|x| !x.is_finite()) {
            return Err(MatchError::NonFinite(format!("x = {} at row {row}", xs[row])));
        }
        for (id, col) in &columns {
            if let Some(row) = col.iter().position(|y| !y.is_finite()) {
                return Err(MatchError::NonFinite(format!("curve {id} = {} at row {row}", col[row])));
            }
        }

        let ids: Vec<CurveId> = columns.iter().map(|(id, _)| *id).collect();
        let flat: Vec<f64> = columns.into_iter().flat_map(|(_, col)| col).collect();
        let values = DMatrix::from_vec(n_rows, ids.len(), flat);

        Ok(Self {
            grid: Grid::new(xs),
            ids,
            values,
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn ids(&self) -> &[CurveId] {
        &self.ids
    }

    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty() || self.grid.is_empty()
    }

    pub fn position(&self, id: CurveId) -> Option<usize> {
        self.ids.binary_search(&id).ok()
    }

    /// Y values of the curve at column `idx`, in grid order.
    pub fn column(&self, idx: usize) -> &[f64] {
        let n = self.values.nrows();
        &self.values.as_slice()[idx * n..(idx + 1) * n]
    }

    pub fn curve(&self, id: CurveId) -> Option<&[f64]> {
        self.position(id).map(|idx| self.column(idx))
    }

    /// Every stored Y of curve column `idx` at exactly `x`.
    pub fn values_at(&self, idx: usize, x: f64) -> impl Iterator<Item = f64> + '_ {
        self.grid
            .positions(x)
            .iter()
            .map(move |&row| self.values[(row, idx)])
    }
}

/// A single test observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryPoint {
    pub x: f64,
    pub y: f64,
}

/// Result of selection for one training series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSelection {
    pub series: CurveId,
    pub candidate: CurveId,
    pub sse: f64,
}

/// One training series with its chosen candidate and the resulting error bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub series: CurveId,
    pub candidate: CurveId,
    pub sse: f64,
    /// `max_x |t[x] - c[x]|` over the whole training series.
    pub max_deviation: f64,
}

/// Tolerance basis for a distinct candidate referenced by a match table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateTolerance {
    pub candidate: CurveId,
    pub max_deviation: f64,
}

/// Ordered match records, one per training series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchTable {
    records: Vec<MatchRecord>,
}

impl MatchTable {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct candidates in first-seen order.
    ///
    /// When several series map to the same candidate, its max deviation is the
    /// largest of theirs.
    pub fn candidate_tolerances(&self) -> Vec<CandidateTolerance> {
        let mut out: Vec<CandidateTolerance> = Vec::new();
        for r in &self.records {
            match out.iter_mut().find(|t| t.candidate == r.candidate) {
                Some(t) => t.max_deviation = t.max_deviation.max(r.max_deviation),
                None => out.push(CandidateTolerance {
                    candidate: r.candidate,
                    max_deviation: r.max_deviation,
                }),
            }
        }
        out
    }
}

/// Outcome for one query point.
///
/// Unmatched points carry `deviation = f64::INFINITY` and no candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub x: f64,
    pub y: f64,
    pub deviation: f64,
    pub candidate: Option<CurveId>,
    pub matched_y: Option<f64>,
}

impl Classification {
    pub fn unmatched(point: QueryPoint) -> Self {
        Self {
            x: point.x,
            y: point.y,
            deviation: f64::INFINITY,
            candidate: None,
            matched_y: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.candidate.is_some()
    }
}

/// Persisted match table (JSON).
///
/// `grid` holds the X values the deviations were measured on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingFile {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub grid: Vec<f64>,
    pub matches: MatchTable,
}

impl MappingFile {
    /// Fail unless `grid` is the grid this mapping was trained on.
    pub fn ensure_grid(&self, grid: &Grid) -> Result<(), MatchError> {
        Grid::new(self.grid.clone()).ensure_same(grid)
    }
}

/// Resolved configuration for a run.
///
/// This is derived from CLI flags (plus environment/defaults).
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub ideal_path: PathBuf,
    pub train_path: Option<PathBuf>,
    pub test_path: Option<PathBuf>,
    /// Persisted match table to read (test-only runs) or write.
    pub mapping_path: Option<PathBuf>,

    pub tolerance_factor: f64,

    pub preview: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_results: Option<PathBuf>,
    /// Include unmatched rows in the results export.
    pub export_all: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_id_orders_numerically_and_round_trips_text() {
        let a: CurveId = "y2".parse().unwrap();
        let b: CurveId = "Y10".parse().unwrap();
        assert!(a < b);
        assert_eq!(b.to_string(), "y10");
        assert!("y0".parse::<CurveId>().is_err());
        assert!("x".parse::<CurveId>().is_err());
    }

    #[test]
    fn grid_lookup_is_exact_and_keeps_duplicates() {
        let grid = Grid::new(vec![-0.0, 1.0, 1.5, 1.0]);
        assert_eq!(grid.positions(0.0), &[0]);
        assert_eq!(grid.positions(1.0), &[1, 3]);
        assert!(grid.positions(1.25).is_empty());
    }

    #[test]
    fn table_sorts_columns_and_rejects_ragged_input() {
        let table = CurveTable::new(
            vec![1.0, 2.0],
            vec![(CurveId(3), vec![30.0, 31.0]), (CurveId(1), vec![10.0, 11.0])],
        )
        .unwrap();
        assert_eq!(table.ids(), &[CurveId(1), CurveId(3)]);
        assert_eq!(table.curve(CurveId(3)).unwrap(), &[30.0, 31.0]);
        assert_eq!(table.values_at(0, 2.0).collect::<Vec<_>>(), vec![11.0]);

        let err = CurveTable::new(vec![1.0, 2.0], vec![(CurveId(1), vec![1.0])]).unwrap_err();
        assert!(matches!(err, MatchError::ShapeMismatch(_)));
    }

    #[test]
    fn table_rejects_non_finite_values() {
        let err = CurveTable::new(vec![f64::NAN, 1.0], vec![(CurveId(1), vec![5.0, 6.0])]).unwrap_err();
        assert!(matches!(err, MatchError::NonFinite(_)));
        assert_eq!(err.exit_code(), 3);

        let err = CurveTable::new(vec![0.0, 1.0], vec![(CurveId(2), vec![5.0, f64::INFINITY])]).unwrap_err();
        assert!(err.to_string().contains("y2"));
    }

    #[test]
    fn mapping_grid_must_match_exactly() {
        let mapping = MappingFile {
            tool: "ideal-match".to_string(),
            generated_at: Utc::now(),
            grid: vec![0.0, 0.5, 1.0],
            matches: MatchTable::default(),
        };
        assert!(mapping.ensure_grid(&Grid::new(vec![-0.0, 0.5, 1.0])).is_ok());

        let shifted = mapping.ensure_grid(&Grid::new(vec![0.0, 0.5, 1.25])).unwrap_err();
        assert!(matches!(shifted, MatchError::ShapeMismatch(_)));
        assert!(mapping.ensure_grid(&Grid::new(vec![0.0, 0.5])).is_err());
    }

    #[test]
    fn tolerances_collapse_shared_candidates_to_their_max() {
        let table = MatchTable::new(vec![
            MatchRecord { series: CurveId(1), candidate: CurveId(7), sse: 1.0, max_deviation: 0.2 },
            MatchRecord { series: CurveId(2), candidate: CurveId(3), sse: 1.0, max_deviation: 0.1 },
            MatchRecord { series: CurveId(3), candidate: CurveId(7), sse: 1.0, max_deviation: 0.5 },
        ]);
        let tol = table.candidate_tolerances();
        assert_eq!(tol.len(), 2);
        assert_eq!(tol[0].candidate, CurveId(7));
        assert_eq!(tol[0].max_deviation, 0.5);
        assert_eq!(tol[1].candidate, CurveId(3));
    }
}
