//! Record source trait for fetching Raw Records

use cinemetrics_core::RawRecord;

/// Errors that can occur when fetching a record
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Movie not found: {0}")]
    NotFound(u64),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Unexpected HTTP status {status}: {message}")]
    HttpStatus { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl FetchError {
    /// Classify a non-success HTTP status
    pub fn from_status(id: u64, status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            401 | 403 => Self::AuthenticationError(message),
            404 => Self::NotFound(id),
            429 => Self::RateLimited(message),
            500..=599 => Self::ServerError { status, message },
            _ => Self::HttpStatus { status, message },
        }
    }

    /// Whether retrying the same request may succeed
    ///
    /// Rate limiting, 5xx responses, timeouts and connection failures are
    /// transient. Everything else fails the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::ServerError { .. } | Self::Timeout(_) | Self::NetworkError(_)
        )
    }
}

/// Trait for sources that deliver one Raw Record per movie id
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Get the source name (e.g., "TMDB", "Mock")
    fn name(&self) -> &'static str;

    /// Fetch the record for a single movie, credits included
    async fn fetch_movie(&self, id: u64) -> Result<RawRecord, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(FetchError::from_status(1, 401, "bad key"), FetchError::AuthenticationError(_)));
        assert_eq!(FetchError::from_status(7, 404, "missing"), FetchError::NotFound(7));
        assert!(matches!(FetchError::from_status(1, 429, "slow down"), FetchError::RateLimited(_)));
        assert!(matches!(
            FetchError::from_status(1, 503, "unavailable"),
            FetchError::ServerError { status: 503, .. }
        ));
        assert!(matches!(FetchError::from_status(1, 418, "teapot"), FetchError::HttpStatus { status: 418, .. }));
    }

    #[test]
    fn test_retryable() {
        assert!(FetchError::RateLimited("x".into()).is_retryable());
        assert!(FetchError::Timeout("x".into()).is_retryable());
        assert!(FetchError::NetworkError("x".into()).is_retryable());
        assert!(FetchError::from_status(1, 500, "x").is_retryable());
        assert!(!FetchError::NotFound(1).is_retryable());
        assert!(!FetchError::AuthenticationError("x".into()).is_retryable());
        assert!(!FetchError::InvalidResponse("x".into()).is_retryable());
    }
}
