//! CSV ingest for offline series.
//!
//! The expected layout is one row per sample with a label column (`year`,
//! `date` or `label`) followed by any subset of variable columns:
//!
//! ```text
//! year,temperature,rainfall,wind,humidity,uvIndex
//! 2020,10,0,3,40,2
//! 2021,12,,4,42,3
//! ```
//!
//! Design goals:
//! - **Alignment first**: a bad or empty cell becomes a missing value in place,
//!   it never shifts or drops the row
//! - **Row-level reporting**: unparsable cells are collected, not fatal
//! - `heatIndex` columns are accepted but ignored (it is always re-derived)

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::domain::{Series, Variable, VariableSet};
use crate::error::AppError;

const LABEL_COLUMNS: [&str; 3] = ["year", "date", "label"];

/// A cell that could not be parsed (kept as missing).
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub column: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct SeriesInput {
    pub set: VariableSet,
    /// Variables that had a column in the file.
    pub columns: Vec<Variable>,
    pub row_errors: Vec<RowError>,
}

/// Load a series CSV from disk.
pub fn load_series_csv(path: &Path) -> Result<SeriesInput, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_series_csv(file)
}

pub fn read_series_csv<R: Read>(reader: R) -> Result<SeriesInput, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let label_idx = LABEL_COLUMNS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| AppError::new(2, "Missing label column: expected `year`, `date` or `label`."))?;

    let columns: Vec<(Variable, usize)> = Variable::BASE
        .into_iter()
        .filter_map(|var| {
            header_map
                .get(&var.key().to_ascii_lowercase())
                .map(|idx| (var, *idx))
        })
        .collect();
    if columns.is_empty() {
        return Err(AppError::new(
            2,
            "No variable columns found (expected any of temperature, rainfall, wind, humidity, uvIndex).",
        ));
    }

    let mut labels = Vec::new();
    let mut values: BTreeMap<Variable, Vec<Option<f64>>> =
        columns.iter().map(|(var, _)| (*var, Vec::new())).collect();
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: 1-based, after the header line.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("CSV parse error on line {line}: {e}")))?;

        let label = record.get(label_idx).unwrap_or("").to_string();
        if label.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        labels.push(label);

        for (var, col) in &columns {
            let cell = record.get(*col).unwrap_or("");
            let value = match parse_cell(cell) {
                Ok(v) => v,
                Err(message) => {
                    tracing::warn!(line, column = var.key(), %message, "unparsable cell treated as missing");
                    row_errors.push(RowError {
                        line,
                        column: var.key().to_string(),
                        message,
                    });
                    None
                }
            };
            if let Some(slot) = values.get_mut(var) {
                slot.push(value);
            }
        }
    }

    if labels.is_empty() {
        return Err(AppError::new(3, "CSV contains no data rows."));
    }

    let set = VariableSet::from_columns(
        labels,
        values.into_iter().map(|(var, v)| (var, Series::new(v))),
    )?;

    Ok(SeriesInput {
        set,
        columns: columns.into_iter().map(|(var, _)| var).collect(),
        row_errors,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_cell(cell: &str) -> Result<Option<f64>, String> {
    let cell = cell.trim();
    if cell.is_empty() || cell.eq_ignore_ascii_case("null") || cell.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let v: f64 = cell
        .parse()
        .map_err(|_| format!("not a number: `{cell}`"))?;
    if !v.is_finite() {
        return Err(format!("non-finite value: `{cell}`"));
    }
    Ok(Some(v))
}
