//! Read/write match table JSON files.
//!
//! The mapping file is the portable result of the training stage:
//! - which candidate each training series selected
//! - the SSE and max deviation of every pair
//!
//! A later `test` run reads it back instead of re-running selection.

use std::fs::File;
use std::path::Path;

use chrono::Utc;
use log::info;

use crate::domain::{Grid, MappingFile, MatchTable};
use crate::error::AppError;

/// Write a match table JSON file.
pub fn write_mapping_json(path: &Path, matches: &MatchTable, grid: &Grid) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create mapping JSON '{}': {e}", path.display())))?;

    let mapping = MappingFile {
        tool: "ideal-match".to_string(),
        generated_at: Utc::now(),
        grid: grid.xs().to_vec(),
        matches: matches.clone(),
    };

    serde_json::to_writer_pretty(file, &mapping)
        .map_err(|e| AppError::new(2, format!("Failed to write mapping JSON: {e}")))?;

    info!("wrote {} match records to {}", matches.records().len(), path.display());
    Ok(())
}

/// Read a match table JSON file.
pub fn read_mapping_json(path: &Path) -> Result<MappingFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open mapping JSON '{}': {e}", path.display())))?;
    let mapping: MappingFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(2, format!("Invalid mapping JSON: {e}")))?;

    if let Some(r) = mapping
        .matches
        .records()
        .iter()
        .find(|r| !(r.max_deviation.is_finite() && r.max_deviation >= 0.0))
    {
        return Err(AppError::new(
            2,
            format!("Invalid mapping JSON: series {} has max deviation {}.", r.series, r.max_deviation),
        ));
    }

    Ok(mapping)
}
