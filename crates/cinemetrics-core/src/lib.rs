//! Cinemetrics Core
//!
//! Shared domain model: the table value, the Clean Table contract,
//! configuration, diagnostics and the run report.
//! Never rename diagnostic codes or Clean Table columns - downstream
//! consumers depend on them.

pub mod config;
pub mod diagnostic;
pub mod raw;
pub mod report;
pub mod schema;
pub mod table;
pub mod tabular;
pub mod value;

pub use config::{Config, ConfigError, PathsConfig, RetrySettings, SourceConfig, TransformSettings};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use raw::{RawRecord, RawRecordError};
pub use report::{ReportVersion, RunReport, RunSummary, StageStats};
pub use schema::{columns, Column, LogicalType, Nullability, Schema};
pub use table::{RowRef, Table, TableError};
pub use tabular::TableIoError;
pub use value::Value;
