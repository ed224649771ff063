//! Command-line parsing for the ideal function matcher.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the matching code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::domain::DEFAULT_TOLERANCE_FACTOR;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ideal-match", version, about = "Select ideal functions for training data and classify test points")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select the best ideal function per training series and optionally save the mapping.
    Train(RunArgs),
    /// Classify test points against a previously saved mapping.
    Test(RunArgs),
    /// Run selection and classification end to end.
    Run(RunArgs),
    /// Write a synthetic ideal/train/test dataset.
    Generate(GenerateArgs),
}

/// Options shared by `train`, `test` and `run`.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    /// Ideal functions CSV (`x,y1..yN`).
    #[arg(long, value_name = "CSV", env = "IDEAL_MATCH_IDEAL")]
    pub ideal: PathBuf,

    /// Training data CSV (`x,y1..yN`), on the same grid as the ideal functions.
    #[arg(long, value_name = "CSV", env = "IDEAL_MATCH_TRAIN")]
    pub train: Option<PathBuf>,

    /// Test data CSV (`x,y`).
    #[arg(long, value_name = "CSV", env = "IDEAL_MATCH_TEST")]
    pub test: Option<PathBuf>,

    /// Mapping JSON: written by `train`/`run`, read by `test`.
    #[arg(long, value_name = "JSON")]
    pub mapping: Option<PathBuf>,

    /// Multiplier applied to each ideal function's max training deviation.
    #[arg(long, env = "IDEAL_MATCH_TOLERANCE", default_value_t = DEFAULT_TOLERANCE_FACTOR)]
    pub tolerance: f64,

    /// Number of classified points to print.
    #[arg(long, default_value_t = 10)]
    pub preview: usize,

    /// Render an ASCII plot of test points over the selected functions.
    #[arg(long)]
    pub plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export classification results to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Include unmatched points in the export (`delta_y = inf`).
    #[arg(long)]
    pub export_all: bool,
}

/// Options for synthetic dataset generation.
#[derive(Debug, Parser, Clone)]
pub struct GenerateArgs {
    /// Directory receiving `ideal.csv`, `train.csv` and `test.csv`.
    #[arg(long, value_name = "DIR")]
    pub out_dir: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of grid points.
    #[arg(long, default_value_t = 400)]
    pub grid: usize,

    /// Number of ideal functions.
    #[arg(long, default_value_t = 50)]
    pub ideal: usize,

    /// Number of training series.
    #[arg(long = "train", default_value_t = 4)]
    pub train: usize,

    /// Number of test points.
    #[arg(long = "test", default_value_t = 100)]
    pub test: usize,

    /// Noise standard deviation.
    #[arg(long, default_value_t = 0.2)]
    pub noise: f64,

    /// Share of test points placed off the selected functions.
    #[arg(long, default_value_t = 0.2)]
    pub off_curve: f64,
}
