//! Diagnostic codes for pipeline events
//!
//! Codes are stable strings that appear in the run report. Add new codes
//! with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Source
    /// A record could not be fetched after all retries
    FetchFailed,

    /// A transient fetch failure was retried
    FetchRetried,

    // Quality filtering
    /// Row dropped because `id` or `title` was null
    MissingIdentity,

    /// Row dropped as a later duplicate of an earlier `id`
    DuplicateId,

    /// Row dropped because its status was not "Released"
    NotReleased,

    /// Row dropped for having too few non-null values
    SparseRow,

    /// No row survived the transformation
    EmptyCleanTable,

    // Reporting
    /// A chart was skipped because its input was insufficient
    ChartSkipped,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchFailed => "FETCH_FAILED",
            Self::FetchRetried => "FETCH_RETRIED",
            Self::MissingIdentity => "MISSING_IDENTITY",
            Self::DuplicateId => "DUPLICATE_ID",
            Self::NotReleased => "NOT_RELEASED",
            Self::SparseRow => "SPARSE_ROW",
            Self::EmptyCleanTable => "EMPTY_CLEAN_TABLE",
            Self::ChartSkipped => "CHART_SKIPPED",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - data was dropped or degraded
    Warn,

    /// Error - a step could not complete
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Movie id the event concerns, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<i64>,

    /// Pipeline stage that produced the event
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            record_id: None,
            stage: None,
        }
    }

    /// Attach the movie id
    pub fn with_record(mut self, record_id: i64) -> Self {
        self.record_id = Some(record_id);
        self
    }

    /// Attach the stage name
    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }
}
