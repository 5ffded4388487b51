//! Export aligned series to CSV and reports to JSON.
//!
//! The series CSV uses the same layout `ingest` reads, so an export can be fed
//! back with `--input` for an offline rerun.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Variable, VariableSet};
use crate::error::AppError;

/// Write the series (including `heatIndex` when present) to a CSV file.
pub fn write_series_csv(path: &Path, set: &VariableSet, label_header: &str) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_series(file, set, label_header)
}

pub fn write_series<W: Write>(writer: W, set: &VariableSet, label_header: &str) -> Result<(), AppError> {
    let mut out = csv::Writer::from_writer(writer);
    let vars: Vec<Variable> = Variable::ALL.into_iter().filter(|v| set.get(*v).is_some()).collect();

    let mut header = vec![label_header.to_string()];
    header.extend(vars.iter().map(|v| v.key().to_string()));
    out.write_record(&header)
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for (idx, label) in set.labels().iter().enumerate() {
        let mut row = vec![label.clone()];
        for var in &vars {
            let cell = set
                .get(*var)
                .and_then(|s| s.get(idx))
                .map(|v| v.to_string())
                .unwrap_or_default();
            row.push(cell);
        }
        out.write_record(&row)
            .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    out.flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
    Ok(())
}

/// Write any report as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, report: &T) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create JSON export '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, report)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON export: {e}")))?;
    Ok(())
}
