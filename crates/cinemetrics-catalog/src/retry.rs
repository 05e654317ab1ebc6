//! Retry policy for transient fetch failures.
//!
//! Implements exponential backoff with configurable parameters.

use crate::adapter::{FetchError, RecordSource};
use cinemetrics_core::{RawRecord, RetrySettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Retry policy implementing exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff before the first retry.
    pub initial_backoff: Duration,
    /// Cap for exponential growth.
    pub max_backoff: Duration,
    /// Multiplier applied to backoff after each retry.
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    /// Create a new RetryPolicy from configuration settings.
    pub fn new(settings: &RetrySettings) -> Self {
        Self {
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            max_backoff: Duration::from_millis(settings.max_backoff_ms),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Backoff before retry number `retry_count` (0-based).
    ///
    /// `initial_backoff * multiplier^retry_count`, capped at `max_backoff`.
    pub fn backoff(&self, retry_count: u32) -> Duration {
        let exponent = i32::try_from(retry_count).unwrap_or(i32::MAX);
        let millis = self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(exponent);
        let capped = millis.min(self.max_backoff.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Check if an error should be retried given the current retry count.
    pub fn should_retry(&self, error: &FetchError, retry_count: u32) -> bool {
        error.is_retryable() && retry_count < self.max_retries
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(&RetrySettings::default())
    }
}

/// Wraps a source, retrying transient failures with backoff
#[derive(Debug)]
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
    retries: AtomicUsize,
}

impl<S: RecordSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            retries: AtomicUsize::new(0),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Total retries performed so far, across all ids
    pub fn retries(&self) -> usize {
        self.retries.load(Ordering::Relaxed)
    }
}

#[async_trait::async_trait]
impl<S: RecordSource> RecordSource for RetryingSource<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn fetch_movie(&self, id: u64) -> Result<RawRecord, FetchError> {
        let mut retry_count = 0;
        loop {
            match self.inner.fetch_movie(id).await {
                Ok(record) => return Ok(record),
                Err(error) if self.policy.should_retry(&error, retry_count) => {
                    let wait = self.policy.backoff(retry_count);
                    tracing::warn!(
                        id,
                        attempt = retry_count + 1,
                        wait_ms = wait.as_millis() as u64,
                        "Transient fetch failure, retrying: {}",
                        error
                    );
                    self.retries.fetch_add(1, Ordering::Relaxed);
                    tokio::time::sleep(wait).await;
                    retry_count += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}
