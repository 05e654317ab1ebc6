//! Sequential fetch loop over a list of movie ids

use crate::adapter::{FetchError, RecordSource};
use cinemetrics_core::{Diagnostic, DiagnosticCode, RawRecord, Severity};
use std::time::Duration;

/// Id used as a placeholder in movie lists; never requested
pub const PLACEHOLDER_ID: u64 = 0;

/// A movie that could not be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct FetchFailure {
    pub id: u64,
    pub error: FetchError,
}

/// Records fetched plus the ids that failed
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub records: Vec<RawRecord>,
    pub failures: Vec<FetchFailure>,
}

impl FetchOutcome {
    /// One warning per failed id
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.failures
            .iter()
            .map(|f| {
                Diagnostic::new(
                    DiagnosticCode::FetchFailed,
                    Severity::Warn,
                    format!("Failed to fetch movie {}: {}", f.id, f.error),
                )
                .with_record(f.id as i64)
                .with_stage("fetch")
            })
            .collect()
    }
}

/// Fetch every id in order, skipping the placeholder id
///
/// Requests are spaced by `delay`. A failed id is logged and recorded in
/// the outcome; it never aborts the batch.
pub async fn collect_records<S>(source: &S, ids: &[u64], delay: Duration) -> FetchOutcome
where
    S: RecordSource + ?Sized,
{
    let wanted: Vec<u64> = ids.iter().copied().filter(|&id| id != PLACEHOLDER_ID).collect();
    tracing::info!(source = source.name(), "Starting to fetch data for {} movies", wanted.len());

    let mut outcome = FetchOutcome::default();
    for (i, &id) in wanted.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match source.fetch_movie(id).await {
            Ok(record) => {
                tracing::info!("Successfully fetched movie ID {}", id);
                outcome.records.push(record);
            }
            Err(error) => {
                tracing::warn!("Failed to fetch movie {}: {}", id, error);
                outcome.failures.push(FetchFailure { id, error });
            }
        }
    }

    tracing::info!(
        failures = outcome.failures.len(),
        "Fetched data for {} movies",
        outcome.records.len()
    );
    outcome
}
