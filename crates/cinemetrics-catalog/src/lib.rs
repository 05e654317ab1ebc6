//! Movie catalog sources for the fetch step
//!
//! This crate provides the `RecordSource` trait and its implementations:
//! - `TmdbSource` - the public movie catalog API over HTTP
//! - `RetryingSource` - exponential backoff around any source
//! - `MockSource` - in-memory records and scripted failures
//!
//! ## Example
//!
//! ```rust,ignore
//! use cinemetrics_catalog::{collect_records, RetryPolicy, RetryingSource, TmdbSource};
//!
//! let source = TmdbSource::from_config(&config.source, config.api_key()?)?;
//! let source = RetryingSource::new(source, RetryPolicy::new(&config.source.retry));
//! let outcome = collect_records(&source, &config.source.movie_ids, delay).await;
//! ```

pub mod adapter;
pub mod collect;
pub mod mock;
pub mod retry;
pub mod tmdb;

pub use adapter::{FetchError, RecordSource};
pub use collect::{collect_records, FetchFailure, FetchOutcome, PLACEHOLDER_ID};
pub use mock::{MockSource, MockSourceBuilder};
pub use retry::{RetryPolicy, RetryingSource};
pub use tmdb::TmdbSource;
