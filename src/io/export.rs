//! CSV exports.
//!
//! - classification results: `x,y,delta_y,ideal_function,y_ideal`. Unmatched rows
//!   (only written when requested) carry `delta_y = inf` and empty candidate fields.
//! - curve tables and query points, in the layout `ingest` reads back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::info;

use crate::domain::{Classification, CurveTable, QueryPoint};
use crate::error::AppError;

/// Write classification results to a CSV file.
///
/// With `include_unmatched = false` only matched points are written.
pub fn write_results_csv(path: &Path, results: &[Classification], include_unmatched: bool) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    let written = write_results(&mut out, results, include_unmatched)?;
    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;

    info!("exported {written} classification rows to {}", path.display());
    Ok(())
}

/// Write classification rows to any writer; returns the number of data rows.
pub fn write_results<W: Write>(out: &mut W, results: &[Classification], include_unmatched: bool) -> Result<usize, AppError> {
    writeln!(out, "x,y,delta_y,ideal_function,y_ideal")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    let mut written = 0;
    for r in results.iter().filter(|r| include_unmatched || r.is_matched()) {
        writeln!(
            out,
            "{},{},{},{},{}",
            r.x,
            r.y,
            r.deviation,
            r.candidate.map(|c| c.to_string()).unwrap_or_default(),
            r.matched_y.map(|v| v.to_string()).unwrap_or_default(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
        written += 1;
    }

    Ok(written)
}

/// Write a curve table as `x,y1,..,yN` CSV (the layout `load_curve_table` reads).
pub fn write_curve_table_csv(path: &Path, table: &CurveTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    let mut header = vec!["x".to_string()];
    header.extend(table.ids().iter().map(|id| id.to_string()));
    writer
        .write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;

    for (row, x) in table.grid().xs().iter().enumerate() {
        let mut record = Vec::with_capacity(table.len() + 1);
        record.push(x.to_string());
        record.extend((0..table.len()).map(|c| table.values()[(row, c)].to_string()));
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

/// Write query points as `x,y` CSV.
pub fn write_query_points_csv(path: &Path, points: &[QueryPoint]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create CSV '{}': {e}", path.display())))?;

    writer
        .write_record(["x", "y"])
        .map_err(|e| AppError::new(2, format!("Failed to write CSV header: {e}")))?;
    for p in points {
        writer
            .write_record([p.x.to_string(), p.y.to_string()])
            .map_err(|e| AppError::new(2, format!("Failed to write CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush CSV '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurveId;
    use crate::io::ingest::{TableKind, load_curve_table, load_query_points};

    fn sample() -> Vec<Classification> {
        vec![
            Classification {
                x: 2.0,
                y: 2.05,
                deviation: 0.05,
                candidate: Some(CurveId(1)),
                matched_y: Some(2.0),
            },
            Classification::unmatched(QueryPoint { x: 7.5, y: -1.0 }),
        ]
    }

    #[test]
    fn matched_only_export() {
        let mut buf = Vec::new();
        let n = write_results(&mut buf, &sample(), false).unwrap();
        assert_eq!(n, 1);
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "x,y,delta_y,ideal_function,y_ideal\n2,2.05,0.05,y1,2\n"
        );
    }

    #[test]
    fn full_export_writes_unmatched_sentinel() {
        let mut buf = Vec::new();
        let n = write_results(&mut buf, &sample(), true).unwrap();
        assert_eq!(n, 2);
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("7.5,-1,inf,,\n"));
    }

    #[test]
    fn dataset_tables_load_back_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let table = CurveTable::new(
            vec![-0.1, 0.0, 0.30000000000000004],
            vec![(CurveId(2), vec![1.5, -2.25, 1e-7]), (CurveId(10), vec![0.0, 3.0, 4.0])],
        )
        .unwrap();
        let points = vec![QueryPoint { x: 0.0, y: 0.1 }, QueryPoint { x: -0.1, y: 1.0 / 3.0 }];

        let table_path = dir.path().join("ideal.csv");
        let points_path = dir.path().join("test.csv");
        write_curve_table_csv(&table_path, &table).unwrap();
        write_query_points_csv(&points_path, &points).unwrap();

        let back = load_curve_table(&table_path, TableKind::Ideal).unwrap();
        assert_eq!(back.ids(), table.ids());
        assert_eq!(back.grid().xs(), table.grid().xs());
        assert_eq!(back.values(), table.values());
        assert_eq!(load_query_points(&points_path).unwrap().points, points);
    }
}
