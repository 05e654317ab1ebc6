//! Transform pipeline with an injected output sink

use crate::transformer::Transformer;
use cinemetrics_core::tabular::{self, TableIoError};
use cinemetrics_core::{Diagnostic, DiagnosticCode, RawRecord, RunReport, Severity, Table};
use std::path::{Path, PathBuf};

/// Destination for the Clean Table
pub trait TableSink {
    /// Human-readable destination, for logs
    fn describe(&self) -> String;

    /// Persist the table
    fn write(&mut self, table: &Table) -> Result<(), TableIoError>;
}

/// Writes the table as CSV to a file
#[derive(Debug, Clone)]
pub struct CsvFileSink {
    path: PathBuf,
}

impl CsvFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TableSink for CsvFileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn write(&mut self, table: &Table) -> Result<(), TableIoError> {
        tabular::save_csv(table, &self.path)
    }
}

/// Keeps written tables in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    tables: Vec<Table>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently written table
    pub fn last(&self) -> Option<&Table> {
        self.tables.last()
    }

    pub fn writes(&self) -> usize {
        self.tables.len()
    }
}

impl TableSink for MemorySink {
    fn describe(&self) -> String {
        "memory".to_string()
    }

    fn write(&mut self, table: &Table) -> Result<(), TableIoError> {
        self.tables.push(table.clone());
        Ok(())
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: Table,
    pub report: RunReport,
}

/// Raw Records in, Clean Table out to a sink, with a run report
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    transformer: Transformer,
}

impl TransformPipeline {
    pub fn new(transformer: Transformer) -> Self {
        Self { transformer }
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    /// Transform `records` and write the result to `sink`
    ///
    /// An empty result is still written, and flagged as an error in the report.
    pub fn run(&self, records: &[RawRecord], sink: &mut dyn TableSink) -> Result<PipelineOutput, TableIoError> {
        let output = self.transformer.transform_with_report(records);

        let mut report = RunReport::new();
        report.summary.records_fetched = records.len();
        report.record_stages(output.stages);
        report.extend_diagnostics(output.diagnostics);
        if output.table.is_empty() {
            tracing::error!("No rows survived the transformation of {} records", records.len());
            report.add_diagnostic(
                Diagnostic::new(
                    DiagnosticCode::EmptyCleanTable,
                    Severity::Error,
                    format!("Clean Table is empty: none of {} records survived", records.len()),
                )
                .with_stage("transform"),
            );
        }
        report.output_sha256 = Some(tabular::fingerprint(&output.table)?);

        sink.write(&output.table)?;
        tracing::info!(
            rows = output.table.len(),
            dropped = report.summary.rows_in.saturating_sub(report.summary.rows_out),
            "Clean Table written to {}",
            sink.describe()
        );

        Ok(PipelineOutput {
            table: output.table,
            report,
        })
    }
}
