//! Run report schema (run_report.json v1)
//!
//! This schema is versioned. Breaking changes require a new version.

use crate::diagnostic::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};

/// Report schema version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    /// Major version (breaking changes)
    pub major: u32,

    /// Minor version (backward-compatible additions)
    pub minor: u32,
}

impl ReportVersion {
    /// Current report schema version
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Row counts around one transformation stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageStats {
    /// Stage name
    pub stage: String,

    /// Rows entering the stage
    pub rows_in: usize,

    /// Rows leaving the stage
    pub rows_out: usize,

    /// Columns after the stage
    pub columns_out: usize,
}

impl StageStats {
    /// Rows removed by the stage
    pub fn dropped(&self) -> usize {
        self.rows_in.saturating_sub(self.rows_out)
    }
}

/// Summary statistics for a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Records returned by the source
    pub records_fetched: usize,

    /// Records the source failed to deliver
    pub fetch_failures: usize,

    /// Rows entering the Transformer
    pub rows_in: usize,

    /// Rows in the Clean Table
    pub rows_out: usize,

    /// Number of warnings
    pub warnings: usize,

    /// Number of errors
    pub errors: usize,
}

/// Pipeline run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Schema version
    pub version: ReportVersion,

    /// Timestamp (ISO 8601)
    pub timestamp: String,

    /// Summary statistics
    pub summary: RunSummary,

    /// Per-stage row counts, in execution order
    pub stages: Vec<StageStats>,

    /// All diagnostics
    pub diagnostics: Vec<Diagnostic>,

    /// SHA-256 of the written Clean Table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_sha256: Option<String>,
}

impl RunReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: RunSummary::default(),
            stages: Vec::new(),
            diagnostics: Vec::new(),
            output_sha256: None,
        }
    }

    /// Record the Transformer's stage accounting
    pub fn record_stages(&mut self, stages: Vec<StageStats>) {
        if let Some(first) = stages.first() {
            self.summary.rows_in = first.rows_in;
        }
        if let Some(last) = stages.last() {
            self.summary.rows_out = last.rows_out;
        }
        self.stages = stages;
    }

    /// Add a diagnostic to the report
    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Error => self.summary.errors += 1,
            Severity::Warn => self.summary.warnings += 1,
            Severity::Info => {}
        }
        self.diagnostics.push(diagnostic);
    }

    /// Add several diagnostics
    pub fn extend_diagnostics(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.add_diagnostic(diagnostic);
        }
    }

    /// Check if the report has any errors
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to file, creating parent directories
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticCode;

    fn stage(name: &str, rows_in: usize, rows_out: usize) -> StageStats {
        StageStats {
            stage: name.to_string(),
            rows_in,
            rows_out,
            columns_out: 18,
        }
    }

    #[test]
    fn empty_report() {
        let report = RunReport::new();
        assert_eq!(report.version, ReportVersion::CURRENT);
        assert_eq!(report.summary.rows_out, 0);
        assert!(!report.has_errors());
    }

    #[test]
    fn stages_drive_summary() {
        let mut report = RunReport::new();
        report.record_stages(vec![stage("prune", 19, 19), stage("filter_quality", 19, 17)]);
        assert_eq!(report.summary.rows_in, 19);
        assert_eq!(report.summary.rows_out, 17);
        assert_eq!(report.stages[1].dropped(), 2);
    }

    #[test]
    fn diagnostics_counted_by_severity() {
        let mut report = RunReport::new();
        report.extend_diagnostics(vec![
            Diagnostic::new(DiagnosticCode::DuplicateId, Severity::Warn, "dup"),
            Diagnostic::new(DiagnosticCode::FetchFailed, Severity::Error, "404"),
            Diagnostic::new(DiagnosticCode::FetchRetried, Severity::Info, "retried"),
        ]);
        assert_eq!(report.summary.warnings, 1);
        assert_eq!(report.summary.errors, 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serialization() {
        let report = RunReport::new();
        let json = report.to_json().unwrap();
        assert!(json.contains("\"version\""));
        assert!(json.contains("\"stages\""));
        assert!(!json.contains("output_sha256"));
    }
}
