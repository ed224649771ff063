//! CSV ingest for curve tables and query points.
//!
//! One loader serves every grid-aligned table; `TableKind` only selects the
//! labels used in logs and errors. Query points have their own, more tolerant
//! loader.
//!
//! Design goals:
//! - **Strict schema** for curve tables (`x` plus `y<N>` columns, every cell numeric)
//! - **Row-level validation** for query points (skip bad rows, but report what happened)
//! - **Deterministic behavior** (curve columns are ordered by id, rows by file order)
//! - **Separation of concerns**: no matching logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use log::{info, warn};

use crate::domain::{CurveId, CurveTable, QueryPoint};
use crate::error::AppError;

/// Which grid-aligned table is being loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Candidate bank (`x, y1..y50` in the usual dataset).
    Ideal,
    /// Noisy training series (`x, y1..y4`).
    Train,
}

impl TableKind {
    pub fn label(self) -> &'static str {
        match self {
            TableKind::Ideal => "ideal functions",
            TableKind::Train => "training data",
        }
    }
}

/// A row-level error encountered during query point ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Query point ingest output: valid points + skipped rows.
#[derive(Debug, Clone)]
pub struct QueryIngest {
    pub points: Vec<QueryPoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a grid-aligned curve table from a CSV file.
pub fn load_curve_table(path: &Path, kind: TableKind) -> Result<CurveTable, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to open {} CSV '{}': {e}", kind.label(), path.display()),
        )
    })?;
    let table = read_curve_table(file, kind)?;
    info!(
        "loaded {}: {} curves x {} rows from {}",
        kind.label(),
        table.len(),
        table.grid().len(),
        path.display()
    );
    Ok(table)
}

/// Parse a grid-aligned curve table from any reader.
pub fn read_curve_table<R: Read>(reader: R, kind: TableKind) -> Result<CurveTable, AppError> {
    let mut reader = csv_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read {} CSV headers: {e}", kind.label())))?
        .clone();
    let header_map = build_header_map(&headers, kind.label())?;

    let x_idx = *header_map
        .get("x")
        .ok_or_else(|| AppError::new(2, format!("Missing required column in {}: `x`", kind.label())))?;

    let mut curve_cols: Vec<(CurveId, usize)> = Vec::new();
    for (name, &idx) in &header_map {
        if name == "x" {
            continue;
        }
        let id: CurveId = name
            .parse()
            .map_err(|e| AppError::new(2, format!("Unexpected column `{name}` in {}: {e}", kind.label())))?;
        curve_cols.push((id, idx));
    }
    if curve_cols.is_empty() {
        return Err(AppError::new(
            2,
            format!("No `y<N>` curve columns found in {}.", kind.label()),
        ));
    }
    curve_cols.sort_by_key(|(id, _)| *id);

    let mut xs = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); curve_cols.len()];

    for (idx, result) in reader.records().enumerate() {
        // +2: one for the header row, one for 1-based line numbers.
        let line = idx + 2;
        let record = result
            .map_err(|e| AppError::new(2, format!("{} line {line}: CSV parse error: {e}", kind.label())))?;

        xs.push(parse_cell(&record, x_idx, "x", line, kind)?);
        for (slot, (id, col_idx)) in curve_cols.iter().enumerate() {
            columns[slot].push(parse_cell(&record, *col_idx, &id.to_string(), line, kind)?);
        }
    }

    if xs.is_empty() {
        return Err(AppError::new(3, format!("No rows found in {}.", kind.label())));
    }

    let columns = curve_cols.iter().map(|(id, _)| *id).zip(columns).collect();
    CurveTable::new(xs, columns).map_err(AppError::from)
}

/// Load query points (`x, y`) from a CSV file.
pub fn load_query_points(path: &Path) -> Result<QueryIngest, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open test CSV '{}': {e}", path.display())))?;
    let ingest = read_query_points(file)?;
    info!(
        "loaded {} test points ({} rows read, {} skipped) from {}",
        ingest.points.len(),
        ingest.rows_read,
        ingest.row_errors.len(),
        path.display()
    );
    Ok(ingest)
}

/// Parse query points from any reader, skipping malformed rows.
pub fn read_query_points<R: Read>(reader: R) -> Result<QueryIngest, AppError> {
    let mut reader = csv_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read test CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers, "test data")?;

    let x_idx = *header_map
        .get("x")
        .ok_or_else(|| AppError::new(2, "Missing required column in test data: `x`"))?;
    let y_idx = *header_map
        .get("y")
        .ok_or_else(|| AppError::new(2, "Missing required column in test data: `y`"))?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let x = parse_opt_f64(record.get(x_idx));
        let y = parse_opt_f64(record.get(y_idx));
        match (x, y) {
            (Some(x), Some(y)) => points.push(QueryPoint { x, y }),
            _ => row_errors.push(RowError {
                line,
                message: "Missing/invalid `x` or `y` value.".to_string(),
            }),
        }
    }

    for e in &row_errors {
        warn!("test data line {}: {}", e.line, e.message);
    }

    if points.is_empty() {
        return Err(AppError::new(3, "No valid rows remain in test data."));
    }

    Ok(QueryIngest {
        points,
        row_errors,
        rows_read,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn build_header_map(headers: &StringRecord, label: &str) -> Result<HashMap<String, usize>, AppError> {
    let mut map = HashMap::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        let name = normalize_header_name(name);
        if map.contains_key(&name) {
            return Err(AppError::new(2, format!("Duplicate column `{name}` in {label}.")));
        }
        map.insert(name, idx);
    }
    Ok(map)
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_cell(record: &StringRecord, idx: usize, column: &str, line: usize, kind: TableKind) -> Result<f64, AppError> {
    parse_opt_f64(record.get(idx)).ok_or_else(|| {
        AppError::new(
            2,
            format!(
                "{} line {line}: missing/invalid value in column `{column}` ('{}').",
                kind.label(),
                record.get(idx).unwrap_or("")
            ),
        )
    })
}

fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
