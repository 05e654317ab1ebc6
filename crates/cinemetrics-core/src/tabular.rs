//! Delimited-text persistence for tables
//!
//! One header row, then one line per row. Nulls are empty fields, floats use
//! full round-trip precision, dates are `YYYY-MM-DD`.

use crate::schema::Schema;
use crate::table::{Table, TableError};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::Path;

/// Errors reading or writing tabular files
#[derive(Debug, thiserror::Error)]
pub enum TableIoError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("IO error on {0}: {1}")]
    IoError(String, String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error(transparent)]
    Shape(#[from] TableError),
}

/// Write a table as CSV
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<(), TableIoError> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(table.columns())?;

    for row in table.rows() {
        out.write_record(row.values().iter().map(|v| v.to_string()))?;
    }

    out.flush()
        .map_err(|e| TableIoError::IoError("<writer>".to_string(), e.to_string()))?;
    Ok(())
}

/// Render a table as CSV bytes
pub fn to_csv_bytes(table: &Table) -> Result<Vec<u8>, TableIoError> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf)?;
    Ok(buf)
}

/// Write a table to a CSV file, creating parent directories
pub fn save_csv(table: &Table, path: &Path) -> Result<(), TableIoError> {
    let io_err = |e: std::io::Error| TableIoError::IoError(path.display().to_string(), e.to_string());

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    write_csv(table, std::io::BufWriter::new(file))?;
    tracing::debug!(rows = table.len(), "CSV written to {}", path.display());
    Ok(())
}

/// Read a CSV table, typing columns declared in `schema`
///
/// Columns the schema does not declare are typed from their content.
pub fn read_csv<R: Read>(reader: R, schema: &Schema) -> Result<Table, TableIoError> {
    let mut input = csv::Reader::from_reader(reader);
    let headers: Vec<String> = input.headers()?.iter().map(str::to_string).collect();
    let types: Vec<_> = headers.iter().map(|h| schema.type_of(h)).collect();

    let mut table = Table::new(headers);
    for record in input.records() {
        let record = record?;
        let row = types
            .iter()
            .zip(record.iter())
            .map(|(ty, field)| ty.parse_field(field))
            .collect();
        table.push_row(row)?;
    }

    Ok(table)
}

/// Load a CSV table from disk
pub fn load_csv(path: &Path, schema: &Schema) -> Result<Table, TableIoError> {
    if !path.exists() {
        return Err(TableIoError::NotFound(path.display().to_string()));
    }
    let file = std::fs::File::open(path)
        .map_err(|e| TableIoError::IoError(path.display().to_string(), e.to_string()))?;
    read_csv(std::io::BufReader::new(file), schema)
}

/// SHA-256 (hex) of the table's CSV rendering
pub fn fingerprint(table: &Table) -> Result<String, TableIoError> {
    let bytes = to_csv_bytes(table)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
