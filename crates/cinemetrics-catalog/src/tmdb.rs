//! Movie catalog API source
//!
//! Fetches `/movie/{id}` with credits appended, one request per movie.

use crate::adapter::{FetchError, RecordSource};
use cinemetrics_core::{RawRecord, SourceConfig};
use std::time::Duration;

/// HTTP source for the public movie catalog
pub struct TmdbSource {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TmdbSource {
    /// Create a source against `base_url` with a per-request timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(FetchError::ConfigError("API key is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Create a source from the `[source]` configuration section
    pub fn from_config(config: &SourceConfig, api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::new(
            config.base_url.clone(),
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Request URL for one movie
    pub fn movie_url(&self, id: u64) -> String {
        format!(
            "{}/movie/{}?append_to_response=credits&api_key={}",
            self.base_url, id, self.api_key
        )
    }
}

impl std::fmt::Debug for TmdbSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbSource")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait::async_trait]
impl RecordSource for TmdbSource {
    fn name(&self) -> &'static str {
        "TMDB"
    }

    async fn fetch_movie(&self, id: u64) -> Result<RawRecord, FetchError> {
        let response = self
            .client
            .get(self.movie_url(id))
            .send()
            .await
            .map_err(|e| request_error(id, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(id, status = status.as_u16(), "Catalog request rejected");
            return Err(FetchError::from_status(id, status.as_u16(), body));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::InvalidResponse(format!("movie {}: {}", id, e)))?;

        match value {
            serde_json::Value::Object(record) => Ok(record),
            other => Err(FetchError::InvalidResponse(format!(
                "movie {}: expected a JSON object, got {}",
                id, other
            ))),
        }
    }
}

fn request_error(id: u64, error: reqwest::Error) -> FetchError {
    // reqwest errors carry the full URL, api key included
    let error = error.without_url();
    if error.is_timeout() {
        FetchError::Timeout(format!("movie {}: {}", id, error))
    } else {
        FetchError::NetworkError(format!("movie {}: {}", id, error))
    }
}
