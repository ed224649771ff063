//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the matching code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::domain::{Classification, MatchTable};
use crate::report::ErrorStats;

/// Format the training summary (one line per series).
pub fn format_match_summary(matches: &MatchTable) -> String {
    let mut out = String::new();

    out.push_str("Best matching ideal functions:\n");
    out.push_str(&format!(
        "{:<8} {:<10} {:>14} {:>14}\n",
        "train", "ideal", "SSE", "max_dev"
    ));
    out.push_str(&format!("{:-<8} {:-<10} {:-<14} {:-<14}\n", "", "", "", ""));

    for r in matches.records() {
        out.push_str(&format!(
            "{:<8} {:<10} {:>14.6} {:>14.6}\n",
            r.series.to_string(),
            r.candidate.to_string(),
            r.sse,
            r.max_deviation
        ));
    }

    out
}

/// Format classification statistics.
pub fn format_stats(stats: &ErrorStats, tolerance_factor: f64) -> String {
    let mut out = String::new();

    out.push_str(&format!("Test points: n={} | tolerance factor={tolerance_factor:.4}\n", stats.total()));
    out.push_str(&format!("Matched: {} | Unmatched: {}\n", stats.matched, stats.unmatched));
    out.push_str(&format!("Mean error: {}\n", fmt_opt(stats.mean_error)));
    out.push_str(&format!("Max error: {}\n", fmt_opt(stats.max_error)));
    out.push_str(&format!("Std dev of error: {}\n", fmt_opt(stats.std_dev)));

    out
}

/// Format the first `limit` classifications as a table.
pub fn format_classifications(results: &[Classification], limit: usize) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:>12} {:>12} {:>12} {:<8} {:>12}\n",
        "x", "y", "delta_y", "ideal", "y_ideal"
    ));
    out.push_str(&format!("{:-<12} {:-<12} {:-<12} {:-<8} {:-<12}\n", "", "", "", "", ""));

    for r in results.iter().take(limit) {
        let ideal = r.candidate.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        let y_ideal = r.matched_y.map(|v| format!("{v:.4}")).unwrap_or_else(|| "-".to_string());
        let line = format!(
            "{:>12.4} {:>12.4} {:>12.6} {:<8} {:>12}",
            r.x, r.y, r.deviation, ideal, y_ideal
        );
        out.push_str(line.trim_end());
        out.push('\n');
    }
    if results.len() > limit {
        out.push_str(&format!("... ({} more)\n", results.len() - limit));
    }

    out
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_else(|| "n/a".to_string())
}
