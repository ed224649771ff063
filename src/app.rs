//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the ideal/train/test tables
//! - runs selection + classification
//! - prints reports/plots
//! - writes optional exports

use std::fs::create_dir_all;

use clap::Parser;

use crate::cli::{Command, GenerateArgs, RunArgs};
use crate::domain::{MatchConfig, MatchTable};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `ideal-match` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Train(args) => handle_train(args),
        Command::Test(args) => handle_test(args),
        Command::Run(args) => handle_run(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn handle_train(args: RunArgs) -> Result<(), AppError> {
    let config = match_config_from_args(&args);
    let out = pipeline::run_train(&config)?;

    println!("{}", crate::report::format_match_summary(&out.matches));

    if let Some(path) = &config.mapping_path {
        crate::io::mapping::write_mapping_json(path, &out.matches, out.ideal.grid())?;
    }
    Ok(())
}

fn handle_test(args: RunArgs) -> Result<(), AppError> {
    let config = match_config_from_args(&args);
    let mapping_path = config
        .mapping_path
        .as_deref()
        .ok_or_else(|| AppError::new(2, "`test` needs a saved mapping (`--mapping`)."))?;

    let ideal = crate::io::ingest::load_curve_table(&config.ideal_path, crate::io::ingest::TableKind::Ideal)?;
    let matches = pipeline::load_mapping(mapping_path, &ideal)?;

    let test = pipeline::run_test(&config, &ideal, &matches)?;
    print_test_output(&config, &ideal, &matches, &test)
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = match_config_from_args(&args);
    let run = pipeline::run_all(&config)?;

    println!("{}", crate::report::format_match_summary(&run.train.matches));

    if let Some(path) = &config.mapping_path {
        crate::io::mapping::write_mapping_json(path, &run.train.matches, run.train.ideal.grid())?;
    }

    print_test_output(&config, &run.train.ideal, &run.train.matches, &run.test)
}

fn print_test_output(
    config: &MatchConfig,
    ideal: &crate::domain::CurveTable,
    matches: &MatchTable,
    test: &pipeline::TestOutput,
) -> Result<(), AppError> {
    if !test.ingest.row_errors.is_empty() {
        println!(
            "Skipped {} of {} test rows (see log for details).\n",
            test.ingest.row_errors.len(),
            test.ingest.rows_read
        );
    }

    println!("{}", crate::report::format_stats(&test.stats, config.tolerance_factor));
    if config.preview > 0 {
        println!("{}", crate::report::format_classifications(&test.results, config.preview));
    }

    if config.plot {
        let plot = crate::plot::render_classification_plot(
            ideal,
            matches,
            &test.results,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_results {
        crate::io::export::write_results_csv(path, &test.results, config.export_all)?;
    }

    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let config = crate::data::SampleConfig {
        seed: args.seed,
        n_grid: args.grid,
        n_ideal: args.ideal,
        n_train: args.train,
        n_test: args.test,
        noise_sd: args.noise,
        off_curve_frac: args.off_curve,
        ..crate::data::SampleConfig::default()
    };
    let data = crate::data::generate_dataset(&config)?;

    create_dir_all(&args.out_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create output dir '{}': {e}", args.out_dir.display()),
        )
    })?;
    crate::io::export::write_curve_table_csv(&args.out_dir.join("ideal.csv"), &data.ideal)?;
    crate::io::export::write_curve_table_csv(&args.out_dir.join("train.csv"), &data.train)?;
    crate::io::export::write_query_points_csv(&args.out_dir.join("test.csv"), &data.test)?;

    println!("Wrote dataset to {}", args.out_dir.display());
    for (series, ideal) in &data.truth {
        println!("- training {series} drawn from ideal {ideal}");
    }
    Ok(())
}

pub fn match_config_from_args(args: &RunArgs) -> MatchConfig {
    MatchConfig {
        ideal_path: args.ideal.clone(),
        train_path: args.train.clone(),
        test_path: args.test.clone(),
        mapping_path: args.mapping.clone(),
        tolerance_factor: args.tolerance,
        preview: args.preview,
        plot: args.plot,
        plot_width: args.width,
        plot_height: args.height,
        export_results: args.export.clone(),
        export_all: args.export_all,
    }
}
