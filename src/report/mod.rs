//! Reporting utilities: error statistics and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::Classification;
use crate::fit::partition;

/// Deviation statistics over a classification run.
///
/// Mean / max / standard deviation are taken over matched points only; they are
/// `None` when nothing matched.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorStats {
    pub matched: usize,
    pub unmatched: usize,
    pub mean_error: Option<f64>,
    pub max_error: Option<f64>,
    /// Population standard deviation.
    pub std_dev: Option<f64>,
}

impl ErrorStats {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

/// Compute deviation statistics for a classification run.
pub fn compute_stats(results: &[Classification]) -> ErrorStats {
    let parts = partition(results);
    let deviations: Vec<f64> = parts.matched.iter().map(|r| r.deviation).collect();

    let matched = deviations.len();
    let unmatched = parts.unmatched.len();
    if matched == 0 {
        return ErrorStats {
            matched,
            unmatched,
            mean_error: None,
            max_error: None,
            std_dev: None,
        };
    }

    let n = matched as f64;
    let mean = deviations.iter().sum::<f64>() / n;
    let max = deviations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let var = deviations.iter().map(|d| (d - mean) * (d - mean)).sum::<f64>() / n;

    ErrorStats {
        matched,
        unmatched,
        mean_error: Some(mean),
        max_error: Some(max),
        std_dev: Some(var.sqrt()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveId, QueryPoint};

    fn matched(deviation: f64) -> Classification {
        Classification {
            x: 0.0,
            y: deviation,
            deviation,
            candidate: Some(CurveId(1)),
            matched_y: Some(0.0),
        }
    }

    #[test]
    fn stats_ignore_unmatched_points() {
        let results = vec![
            matched(0.1),
            Classification::unmatched(QueryPoint { x: 1.0, y: 1.0 }),
            matched(0.3),
        ];
        let stats = compute_stats(&results);
        assert_eq!(stats.matched, 2);
        assert_eq!(stats.unmatched, 1);
        assert_eq!(stats.total(), 3);
        assert!((stats.mean_error.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(stats.max_error, Some(0.3));
        assert!((stats.std_dev.unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn stats_without_matches_have_no_moments() {
        let stats = compute_stats(&[Classification::unmatched(QueryPoint { x: 1.0, y: 1.0 })]);
        assert_eq!(stats.matched, 0);
        assert_eq!(stats.mean_error, None);
        assert_eq!(stats.std_dev, None);
    }
}
