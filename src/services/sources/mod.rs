/// Candidate source abstraction
///
/// A source is anything that can produce a list of raw video records: a bulk
/// recommendation endpoint, a per-category endpoint, the unfiltered catalogue, and so
/// on. Sources know nothing about selection; they only fetch and decode.
use serde_json::Value;

use crate::error::AppResult;

pub mod http;

pub use http::HttpSource;

/// Trait for candidate data sources
///
/// Implementations should return an error for transport failures, non-success
/// statuses, and payloads that do not decode. An empty list is a valid answer; the
/// fallback chain decides whether it is usable.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CandidateSource: Send + Sync {
    /// Fetch raw candidate records
    async fn fetch(&self) -> AppResult<Vec<Value>>;

    /// Source name for logging and error reporting
    fn name(&self) -> String;
}
