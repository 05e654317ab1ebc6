//! Mock record source for testing
//!
//! This source returns predefined records without touching the network.
//! It's useful for:
//! - Unit testing the fetch loop and retry behaviour
//! - Running the full pipeline without an API key
//! - Simulating transient and permanent failures per movie
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cinemetrics_catalog::{MockSource, RecordSource};
//!
//! let source = MockSource::new();
//! source.add_record(record).await;
//!
//! // Fail twice with a retryable error, then succeed
//! source.add_transient_failures(299534, 2).await;
//! ```

use crate::adapter::{FetchError, RecordSource};
use cinemetrics_core::RawRecord;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mock record source for testing
///
/// Records are keyed by their `id` field. Thread-safe with async support.
pub struct MockSource {
    /// Predefined records by movie id
    records: Arc<RwLock<HashMap<u64, RawRecord>>>,

    /// Permanent errors for specific ids
    errors: Arc<RwLock<HashMap<u64, FetchError>>>,

    /// Remaining transient failures per id
    transient: Arc<RwLock<HashMap<u64, u32>>>,

    /// Simulate request latency (milliseconds)
    latency_ms: u64,

    /// Number of fetch calls received
    calls: Arc<AtomicUsize>,
}

impl MockSource {
    /// Create a new mock source with no records
    pub fn new() -> Self {
        Self::from_records(Vec::new())
    }

    /// Create a mock source from records; records without a numeric `id` are ignored
    pub fn from_records(records: Vec<RawRecord>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|r| record_id(&r).map(|id| (id, r)))
            .collect();

        Self {
            records: Arc::new(RwLock::new(records)),
            errors: Arc::new(RwLock::new(HashMap::new())),
            transient: Arc::new(RwLock::new(HashMap::new())),
            latency_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Add a record, keyed by its `id`
    pub async fn add_record(&self, record: RawRecord) {
        if let Some(id) = record_id(&record) {
            self.records.write().await.insert(id, record);
        }
    }

    /// Always fail requests for `id` with `error`
    pub async fn add_error(&self, id: u64, error: FetchError) {
        self.errors.write().await.insert(id, error);
    }

    /// Fail the next `count` requests for `id` with a rate-limit error
    pub async fn add_transient_failures(&self, id: u64, count: u32) {
        self.transient.write().await.insert(id, count);
    }

    /// Configure simulated latency for every request
    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    /// Number of records stored
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Number of `fetch_movie` calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    async fn simulate_latency(&self) {
        if self.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.latency_ms)).await;
        }
    }
}

impl Default for MockSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for MockSource {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            errors: Arc::clone(&self.errors),
            transient: Arc::clone(&self.transient),
            latency_ms: self.latency_ms,
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait::async_trait]
impl RecordSource for MockSource {
    fn name(&self) -> &'static str {
        "Mock"
    }

    async fn fetch_movie(&self, id: u64) -> Result<RawRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;

        if let Some(error) = self.errors.read().await.get(&id) {
            return Err(error.clone());
        }

        {
            let mut transient = self.transient.write().await;
            if let Some(remaining) = transient.get_mut(&id) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(FetchError::RateLimited(format!("simulated 429 for movie {}", id)));
                }
            }
        }

        self.records
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(FetchError::NotFound(id))
    }
}

/// Builder for creating MockSource with records and failures
///
/// ```rust,ignore
/// let source = MockSourceBuilder::new()
///     .with_record(endgame)
///     .with_error(597, FetchError::NotFound(597))
///     .with_transient_failures(299534, 2)
///     .build();
/// ```
#[derive(Default)]
pub struct MockSourceBuilder {
    records: Vec<RawRecord>,
    errors: HashMap<u64, FetchError>,
    transient: HashMap<u64, u32>,
    latency_ms: u64,
}

impl MockSourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, record: RawRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn with_records(mut self, records: impl IntoIterator<Item = RawRecord>) -> Self {
        self.records.extend(records);
        self
    }

    pub fn with_error(mut self, id: u64, error: FetchError) -> Self {
        self.errors.insert(id, error);
        self
    }

    pub fn with_transient_failures(mut self, id: u64, count: u32) -> Self {
        self.transient.insert(id, count);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn build(self) -> MockSource {
        let mut source = MockSource::from_records(self.records).with_latency(self.latency_ms);
        source.errors = Arc::new(RwLock::new(self.errors));
        source.transient = Arc::new(RwLock::new(self.transient));
        source
    }
}

fn record_id(record: &RawRecord) -> Option<u64> {
    record.get("id").and_then(serde_json::Value::as_u64)
}
