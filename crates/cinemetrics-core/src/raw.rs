//! Raw Records as delivered by the catalog source
//!
//! A Raw Record is one JSON object per movie. The persisted form is a JSON
//! array of such objects.

use crate::table::Table;
use crate::value::Value;
use std::path::Path;

/// One unprocessed movie entry
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Errors reading or writing Raw Records
#[derive(Debug, thiserror::Error)]
pub enum RawRecordError {
    #[error("Failed to read {0}: {1}")]
    IoError(String, String),

    #[error("Failed to parse raw records: {0}")]
    ParseError(String),

    #[error("Input is not record-shaped: {0}")]
    NotRecordShaped(String),
}

/// Interpret a JSON document as a sequence of records
///
/// The document must be an array whose every element is an object.
pub fn records_from_value(value: serde_json::Value) -> Result<Vec<RawRecord>, RawRecordError> {
    let serde_json::Value::Array(items) = value else {
        return Err(RawRecordError::NotRecordShaped(format!(
            "expected a JSON array, found {}",
            json_kind(&value)
        )));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(RawRecordError::NotRecordShaped(format!(
                "element {} is {}, expected an object",
                i,
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Parse Raw Records from a JSON string
pub fn parse_raw_records(json: &str) -> Result<Vec<RawRecord>, RawRecordError> {
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| RawRecordError::ParseError(e.to_string()))?;
    records_from_value(value)
}

/// Load Raw Records from a JSON file
pub fn load_raw_records(path: &Path) -> Result<Vec<RawRecord>, RawRecordError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| RawRecordError::IoError(path.display().to_string(), e.to_string()))?;
    let records = parse_raw_records(&contents)?;
    tracing::debug!("Loaded {} raw records from {}", records.len(), path.display());
    Ok(records)
}

/// Persist Raw Records as a JSON array, creating parent directories
pub fn save_raw_records(records: &[RawRecord], path: &Path) -> Result<(), RawRecordError> {
    let io_err = |e: std::io::Error| RawRecordError::IoError(path.display().to_string(), e.to_string());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string(records).map_err(|e| RawRecordError::ParseError(e.to_string()))?;
    std::fs::write(path, json).map_err(io_err)?;
    tracing::info!("Saved {} raw records to {}", records.len(), path.display());
    Ok(())
}

/// Lay records out as a table
///
/// Columns are the union of all record keys in first-seen order; a record
/// lacking a key gets a null cell. Nested values stay as `Value::Json`.
pub fn records_to_table(records: &[RawRecord]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.get(c).map(Value::from_json).unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    // Every row is built from `columns`, so widths always match.
    Table::from_rows(columns, rows).unwrap_or_default()
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
