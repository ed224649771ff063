//! Shared pipeline logic used by every CLI front-end.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load tables -> select best matches -> max deviations -> classify -> stats
//!
//! The command handlers can then focus on presentation (printing, exports).

use std::path::Path;

use log::info;

use crate::domain::{Classification, CurveTable, MatchConfig, MatchTable, QueryPoint};
use crate::error::AppError;
use crate::fit::{build_match_table, classify, select_best_matches};
use crate::io::ingest::{QueryIngest, TableKind, load_curve_table, load_query_points};
use crate::io::mapping::read_mapping_json;
use crate::report::{ErrorStats, compute_stats};

/// Outputs of the training stage.
#[derive(Debug, Clone)]
pub struct TrainOutput {
    pub ideal: CurveTable,
    pub train: CurveTable,
    pub matches: MatchTable,
}

/// Outputs of the classification stage.
#[derive(Debug, Clone)]
pub struct TestOutput {
    pub ingest: QueryIngest,
    pub results: Vec<Classification>,
    pub stats: ErrorStats,
}

/// All computed outputs of a `run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub train: TrainOutput,
    pub test: TestOutput,
}

/// Select + max deviations on in-memory tables.
pub fn match_training(train: &CurveTable, ideal: &CurveTable) -> Result<MatchTable, AppError> {
    let selections = select_best_matches(train, ideal)?;
    let matches = build_match_table(train, ideal, &selections)?;
    for r in matches.records() {
        info!(
            "training series {} -> ideal {} (SSE={:.6}, max deviation={:.6})",
            r.series, r.candidate, r.sse, r.max_deviation
        );
    }
    Ok(matches)
}

/// Classify in-memory query points and summarize the outcome.
pub fn classify_points(
    points: &[QueryPoint],
    matches: &MatchTable,
    ideal: &CurveTable,
    tolerance_factor: f64,
) -> Result<(Vec<Classification>, ErrorStats), AppError> {
    let results = classify(points, matches, ideal, tolerance_factor)?;
    let stats = compute_stats(&results);
    Ok((results, stats))
}

/// Load the ideal and training tables and run the training stage.
pub fn run_train(config: &MatchConfig) -> Result<TrainOutput, AppError> {
    validate_config(config)?;
    let train_path = config
        .train_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "Training data is required (`--train`)."))?;

    let ideal = load_curve_table(&config.ideal_path, TableKind::Ideal)?;
    let train = load_curve_table(train_path, TableKind::Train)?;
    let matches = match_training(&train, &ideal)?;

    Ok(TrainOutput { ideal, train, matches })
}

/// Load test points and classify them against `matches`.
pub fn run_test(config: &MatchConfig, ideal: &CurveTable, matches: &MatchTable) -> Result<TestOutput, AppError> {
    validate_config(config)?;
    let test_path = config
        .test_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "Test data is required (`--test`)."))?;

    let ingest = load_query_points(test_path)?;
    let (results, stats) = classify_points(&ingest.points, matches, ideal, config.tolerance_factor)?;

    Ok(TestOutput { ingest, results, stats })
}

/// Read a saved mapping and check it was trained on `ideal`'s grid.
pub fn load_mapping(path: &Path, ideal: &CurveTable) -> Result<MatchTable, AppError> {
    let mapping = read_mapping_json(path)?;
    mapping.ensure_grid(ideal.grid())?;
    info!("using mapping from {} ({})", path.display(), mapping.generated_at);
    Ok(mapping.matches)
}

/// Execute training and classification end to end.
pub fn run_all(config: &MatchConfig) -> Result<RunOutput, AppError> {
    let train = run_train(config)?;
    let test = run_test(config, &train.ideal, &train.matches)?;
    Ok(RunOutput { train, test })
}

fn validate_config(config: &MatchConfig) -> Result<(), AppError> {
    if !(config.tolerance_factor.is_finite() && config.tolerance_factor >= 0.0) {
        return Err(AppError::new(
            2,
            format!("Invalid tolerance factor {} (must be finite and >= 0).", config.tolerance_factor),
        ));
    }
    if config.plot && (config.plot_width < 10 || config.plot_height < 5) {
        return Err(AppError::new(2, "Plot needs at least 10 columns and 5 rows."));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveId, DEFAULT_TOLERANCE_FACTOR};

    #[test]
    fn end_to_end_on_in_memory_tables() {
        let xs = vec![1.0, 2.0, 3.0];
        let ideal = CurveTable::new(
            xs.clone(),
            vec![(CurveId(1), vec![1.0, 2.0, 3.0]), (CurveId(2), vec![0.0, 0.0, 0.0])],
        )
        .unwrap();
        let train = CurveTable::new(xs, vec![(CurveId(1), vec![1.1, 2.0, 2.9])]).unwrap();

        let matches = match_training(&train, &ideal).unwrap();
        assert_eq!(matches.records()[0].candidate, CurveId(1));
        assert!((matches.records()[0].max_deviation - 0.1).abs() < 1e-12);

        let points = [QueryPoint { x: 2.0, y: 2.05 }, QueryPoint { x: 2.0, y: 3.0 }];
        let (results, stats) = classify_points(&points, &matches, &ideal, DEFAULT_TOLERANCE_FACTOR).unwrap();
        assert_eq!(results[0].candidate, Some(CurveId(1)));
        assert_eq!(results[0].matched_y, Some(2.0));
        assert!(!results[1].is_matched());
        assert_eq!((stats.matched, stats.unmatched), (1, 1));
    }

    #[test]
    fn missing_inputs_are_usage_errors() {
        let config = MatchConfig {
            ideal_path: "ideal.csv".into(),
            train_path: None,
            test_path: None,
            mapping_path: None,
            tolerance_factor: DEFAULT_TOLERANCE_FACTOR,
            preview: 10,
            plot: false,
            plot_width: 100,
            plot_height: 25,
            export_results: None,
            export_all: false,
        };
        assert_eq!(run_train(&config).unwrap_err().exit_code(), 2);

        let bad = MatchConfig {
            tolerance_factor: f64::NAN,
            ..config
        };
        assert!(run_train(&bad).unwrap_err().to_string().contains("tolerance"));
    }
}
