//! Transformer: Raw Records to Clean Table
//!
//! The pipeline is an explicit, ordered list of named stages. Each stage
//! consumes the working table and returns a new one; rows are only ever
//! removed, never partially transformed.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use cinemetrics_core::columns::*;
use cinemetrics_core::raw::{self, RawRecord, RawRecordError};
use cinemetrics_core::{Diagnostic, DiagnosticCode, Schema, Severity, StageStats, Table, TransformSettings, Value};
use std::collections::HashSet;

/// Fields dropped before any other processing
pub const EXCLUDED_FIELDS: &[&str] = &["adult", "imdb_id", "original_title", "video", "homepage"];

/// List-of-objects fields flattened to pipe-joined names
pub const LIST_FIELDS: &[&str] = &[
    GENRES,
    SPOKEN_LANGUAGES,
    PRODUCTION_COUNTRIES,
    PRODUCTION_COMPANIES,
    CREDITS,
];

/// Fields coerced to floating point
pub const NUMERIC_FIELDS: &[&str] = &[BUDGET, REVENUE, RUNTIME, POPULARITY, VOTE_AVERAGE, VOTE_COUNT];

/// Fields where a literal zero means "unknown"
pub const ZERO_IS_UNKNOWN: &[&str] = &[BUDGET, REVENUE, RUNTIME];

/// Free-text fields carried into the Clean Table
pub const TEXT_FIELDS: &[&str] = &[TITLE, TAGLINE, OVERVIEW, ORIGINAL_LANGUAGE, POSTER_PATH];

/// Strings standing in for "no text" in `overview` and `tagline`
pub const TEXT_PLACEHOLDERS: &[&str] = &["No Data", "No overview found.", "No Overview", "N/A", "-"];

/// Separator for flattened lists
pub const LIST_SEPARATOR: &str = "|";

const MILLION: f64 = 1_000_000.0;

/// Errors the Transformer can raise
///
/// Malformed field values never raise; only input that is not a sequence
/// of records does.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    NotRecordShaped(#[from] RawRecordError),
}

/// Named pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    PruneColumns,
    FlattenNested,
    EnforceTypes,
    FilterQuality,
    EnforceSchema,
}

impl Stage {
    /// Every stage, in the order the Transformer runs them
    pub const ALL: [Stage; 5] = [
        Stage::PruneColumns,
        Stage::FlattenNested,
        Stage::EnforceTypes,
        Stage::FilterQuality,
        Stage::EnforceSchema,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PruneColumns => "prune_columns",
            Self::FlattenNested => "flatten_nested",
            Self::EnforceTypes => "enforce_types_and_units",
            Self::FilterQuality => "filter_quality",
            Self::EnforceSchema => "enforce_schema",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Clean Table plus the accounting gathered while producing it
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    /// The Clean Table
    pub table: Table,

    /// Row counts per stage, in execution order
    pub stages: Vec<StageStats>,

    /// One diagnostic per dropped row
    pub diagnostics: Vec<Diagnostic>,
}

/// The transformation pipeline
#[derive(Debug, Clone)]
pub struct Transformer {
    settings: TransformSettings,
    schema: Schema,
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new(TransformSettings::default())
    }
}

impl Transformer {
    /// Create a Transformer targeting the Clean Table contract
    pub fn new(settings: TransformSettings) -> Self {
        Self {
            settings,
            schema: Schema::clean_table(),
        }
    }

    /// Target schema the output is conformed to
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Transform records into the Clean Table
    pub fn transform(&self, records: &[RawRecord]) -> Table {
        self.transform_with_report(records).table
    }

    /// Transform an arbitrary JSON document, rejecting non-record input
    pub fn transform_value(&self, value: serde_json::Value) -> Result<Table, TransformError> {
        let records = raw::records_from_value(value)?;
        Ok(self.transform(&records))
    }

    /// Transform records, keeping per-stage row counts and drop diagnostics
    pub fn transform_with_report(&self, records: &[RawRecord]) -> TransformOutput {
        tracing::info!(records = records.len(), "Starting transformation pipeline");

        let mut table = raw::records_to_table(records);
        let mut stages = Vec::with_capacity(Stage::ALL.len());
        let mut diagnostics = Vec::new();

        for stage in Stage::ALL {
            let rows_in = table.len();
            table = self.run_stage(stage, table, &mut diagnostics);

            tracing::info!(
                stage = stage.name(),
                rows_in,
                rows_out = table.len(),
                columns = table.width(),
                "Stage complete"
            );

            stages.push(StageStats {
                stage: stage.name().to_string(),
                rows_in,
                rows_out: table.len(),
                columns_out: table.width(),
            });
        }

        TransformOutput {
            table,
            stages,
            diagnostics,
        }
    }

    /// Run a single stage
    pub fn run_stage(&self, stage: Stage, table: Table, diagnostics: &mut Vec<Diagnostic>) -> Table {
        match stage {
            Stage::PruneColumns => prune_columns(table),
            Stage::FlattenNested => flatten_nested(table),
            Stage::EnforceTypes => enforce_types_and_units(table),
            Stage::FilterQuality => filter_quality(table, self.settings.min_non_null, diagnostics),
            Stage::EnforceSchema => enforce_schema(table, &self.schema),
        }
    }
}

/// Stage 1: drop the excluded fields that are present
pub fn prune_columns(table: Table) -> Table {
    table.drop_columns(EXCLUDED_FIELDS)
}

/// Stage 2: collapse nested structures into scalar text
pub fn flatten_nested(table: Table) -> Table {
    let mut table = table.map_column(BELONGS_TO_COLLECTION, collection_name);

    for field in LIST_FIELDS {
        table = table.map_column(field, join_names);
    }
    table
}

/// Stage 3: coerce types, normalize placeholders, convert units
pub fn enforce_types_and_units(table: Table) -> Table {
    let mut table = table.map_column(ID, coerce_id);

    for field in NUMERIC_FIELDS {
        table = table.map_column(field, coerce_float);
    }
    for field in ZERO_IS_UNKNOWN {
        table = table.map_column(field, zero_to_null);
    }
    for field in TEXT_FIELDS {
        table = table.map_column(field, coerce_text);
    }

    table = table
        .map_column(RELEASE_DATE, coerce_date)
        .map_column(OVERVIEW, placeholder_to_null)
        .map_column(TAGLINE, placeholder_to_null);

    if table.has_column(VOTE_AVERAGE) && table.has_column(VOTE_COUNT) {
        table = table.with_derived(VOTE_AVERAGE, |row| {
            if row.float(VOTE_COUNT) == Some(0.0) {
                Value::Null
            } else {
                row.value(VOTE_AVERAGE).clone()
            }
        });
    }

    table
        .map_column(BUDGET, to_millions)
        .map_column(REVENUE, to_millions)
        .rename_column(BUDGET, BUDGET_MUSD)
        .rename_column(REVENUE, REVENUE_MUSD)
}

/// Stage 4: identity, duplicate, release-status and sparsity filters
///
/// The sub-filters run in a fixed order and each sees only the rows that
/// survived the previous one.
pub fn filter_quality(table: Table, min_non_null: usize, diagnostics: &mut Vec<Diagnostic>) -> Table {
    let initial = table.len();

    let table = drop_missing_identity(table, diagnostics);
    let table = dedupe_by_id(table, diagnostics);
    let table = keep_released(table, diagnostics);
    let table = drop_sparse_rows(table, min_non_null, diagnostics);

    tracing::info!("Quality filter: {} -> {} rows", initial, table.len());
    table
}

/// Drop rows whose `id` or `title` is null
pub fn drop_missing_identity(table: Table, diagnostics: &mut Vec<Diagnostic>) -> Table {
    table.filter_rows(|row| {
        let keep = !row.is_null(ID) && !row.is_null(TITLE);
        if !keep {
            let mut diag = Diagnostic::new(
                DiagnosticCode::MissingIdentity,
                Severity::Warn,
                format!("Row {} dropped: missing id or title", row.index()),
            )
            .with_stage(Stage::FilterQuality.name());
            if let Some(id) = row.int(ID) {
                diag = diag.with_record(id);
            }
            diagnostics.push(diag);
        }
        keep
    })
}

/// Keep the first row for each `id`
pub fn dedupe_by_id(table: Table, diagnostics: &mut Vec<Diagnostic>) -> Table {
    let mut seen = HashSet::new();

    table.filter_rows(|row| {
        let Some(id) = row.int(ID) else {
            return true;
        };
        let first = seen.insert(id);
        if !first {
            tracing::debug!(id, "Dropping duplicate record");
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::DuplicateId,
                    Severity::Warn,
                    format!("Duplicate id {} dropped, first occurrence kept", id),
                )
                .with_record(id)
                .with_stage(Stage::FilterQuality.name()),
            );
        }
        first
    })
}

/// Keep only released titles, then drop the `status` column
pub fn keep_released(table: Table, diagnostics: &mut Vec<Diagnostic>) -> Table {
    if !table.has_column(STATUS) {
        return table;
    }

    table
        .filter_rows(|row| {
            let released = row.text(STATUS) == Some("Released");
            if !released {
                let status = row.value(STATUS).to_string();
                let mut diag = Diagnostic::new(
                    DiagnosticCode::NotReleased,
                    Severity::Warn,
                    format!("Row dropped: status is '{}'", status),
                )
                .with_stage(Stage::FilterQuality.name());
                if let Some(id) = row.int(ID) {
                    diag = diag.with_record(id);
                }
                diagnostics.push(diag);
            }
            released
        })
        .drop_columns(&[STATUS])
}

/// Drop rows with fewer than `min_non_null` non-null cells
///
/// A row can never hold more values than the table has columns, so the
/// requirement is capped at the table width.
pub fn drop_sparse_rows(table: Table, min_non_null: usize, diagnostics: &mut Vec<Diagnostic>) -> Table {
    let threshold = min_non_null.min(table.width());

    table.filter_rows(|row| {
        let count = row.non_null_count();
        let keep = count >= threshold;
        if !keep {
            let mut diag = Diagnostic::new(
                DiagnosticCode::SparseRow,
                Severity::Warn,
                format!("Row dropped: {} non-null values, {} required", count, threshold),
            )
            .with_stage(Stage::FilterQuality.name());
            if let Some(id) = row.int(ID) {
                diag = diag.with_record(id);
            }
            diagnostics.push(diag);
        }
        keep
    })
}

/// Stage 5: conform to the target column order
pub fn enforce_schema(table: Table, schema: &Schema) -> Table {
    table.reindex(&schema.column_names())
}

fn collection_name(value: &Value) -> Value {
    match value {
        Value::Json(serde_json::Value::Object(map)) => map
            .get("name")
            .and_then(serde_json::Value::as_str)
            .map(Value::from)
            .unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// Pipe-join the `name` of each element, preserving source order
fn join_names(value: &Value) -> Value {
    let Value::Json(serde_json::Value::Array(items)) = value else {
        return Value::Null;
    };

    let names: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("name").and_then(serde_json::Value::as_str))
        .collect();

    if names.is_empty() {
        Value::Null
    } else {
        Value::Text(names.join(LIST_SEPARATOR))
    }
}

fn coerce_id(value: &Value) -> Value {
    match value {
        Value::Text(s) => s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Null),
        other => other.as_i64().map(Value::Int).unwrap_or(Value::Null),
    }
}

fn coerce_float(value: &Value) -> Value {
    match value {
        Value::Int(i) => Value::Float(*i as f64),
        Value::Float(f) => Value::float(*f),
        Value::Text(s) => s.trim().parse::<f64>().map(Value::float).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn zero_to_null(value: &Value) -> Value {
    match value.as_f64() {
        Some(v) if v == 0.0 => Value::Null,
        _ => value.clone(),
    }
}

fn to_millions(value: &Value) -> Value {
    Value::from_opt_f64(value.as_f64().map(|v| v / MILLION))
}

fn coerce_text(value: &Value) -> Value {
    match value {
        Value::Text(_) => value.clone(),
        Value::Int(_) | Value::Float(_) => Value::Text(value.to_string()),
        _ => Value::Null,
    }
}

fn placeholder_to_null(value: &Value) -> Value {
    match value {
        Value::Text(s) if s.trim().is_empty() || TEXT_PLACEHOLDERS.contains(&s.trim()) => Value::Null,
        other => other.clone(),
    }
}

fn coerce_date(value: &Value) -> Value {
    match value {
        Value::Date(_) => value.clone(),
        Value::Text(s) => parse_date(s.trim()).map(Value::Date).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
    const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
