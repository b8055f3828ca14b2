use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::SourceError,
    models::{ContentItem, Tier},
    services::{adapter::ItemAdapter, sources::CandidateSource},
};

/// Candidate pool taken from the first tier that produced usable items
#[derive(Debug, Clone)]
pub struct TierPool {
    pub tier: Tier,
    /// Adapted but not yet deduplicated, so a shuffle can still run first
    pub items: Vec<ContentItem>,
}

/// Ordered set of candidate sources tried until one yields a usable pool
///
/// Tiers run strictly in order: primary, merged secondaries, full pool, last resort.
/// A tier fails when its fetch errors, exceeds `fetch_timeout`, or produces no item
/// with an id. Tiers without a configured source are skipped.
pub struct FallbackChain {
    primary: Option<Arc<dyn CandidateSource>>,
    secondary: Vec<Arc<dyn CandidateSource>>,
    full_pool: Option<Arc<dyn CandidateSource>>,
    last_resort: Option<Arc<dyn CandidateSource>>,
    adapter: Arc<dyn ItemAdapter>,
    fetch_timeout: Duration,
}

impl FallbackChain {
    pub fn new(adapter: Arc<dyn ItemAdapter>, fetch_timeout: Duration) -> Self {
        Self {
            primary: None,
            secondary: Vec::new(),
            full_pool: None,
            last_resort: None,
            adapter,
            fetch_timeout,
        }
    }

    pub fn with_primary(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.primary = Some(source);
        self
    }

    /// Adds a secondary source; merge order follows insertion order
    pub fn with_secondary(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.secondary.push(source);
        self
    }

    pub fn with_full_pool(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.full_pool = Some(source);
        self
    }

    pub fn with_last_resort(mut self, source: Arc<dyn CandidateSource>) -> Self {
        self.last_resort = Some(source);
        self
    }

    /// Number of configured sources across all tiers
    pub fn source_count(&self) -> usize {
        self.primary.iter().count()
            + self.secondary.len()
            + self.full_pool.iter().count()
            + self.last_resort.iter().count()
    }

    /// Walks the tiers until one yields a usable pool
    ///
    /// Per-tier failures are logged and swallowed. Only when every tier has failed is
    /// an error returned, carrying the most recent cause.
    pub async fn resolve(&self) -> Result<TierPool, SourceError> {
        let mut tier = Tier::Primary;
        let mut last_error: Option<SourceError> = None;

        while tier != Tier::Exhausted {
            match self.attempt(tier).await {
                Ok(Some(items)) => {
                    tracing::info!(tier = %tier, candidates = items.len(), "Candidate tier resolved");
                    return Ok(TierPool { tier, items });
                }
                Ok(None) => {
                    tracing::debug!(tier = %tier, "Candidate tier not configured, skipping");
                }
                Err(e) => {
                    tracing::warn!(tier = %tier, error = %e, "Candidate tier failed, falling back");
                    last_error = Some(e);
                }
            }
            tier = tier.next();
        }

        tracing::error!(last_error = ?last_error, "All candidate tiers exhausted");

        Err(SourceError::Exhausted {
            last_cause: last_error.map(Box::new),
        })
    }

    /// `Ok(None)` means the tier has no source configured
    async fn attempt(&self, tier: Tier) -> Result<Option<Vec<ContentItem>>, SourceError> {
        let records = match tier {
            Tier::Primary => match &self.primary {
                Some(source) => self.fetch_one(source.as_ref()).await?,
                None => return Ok(None),
            },
            Tier::SecondaryMerged => {
                if self.secondary.is_empty() {
                    return Ok(None);
                }
                self.fetch_merged().await?
            }
            Tier::FullPool => match &self.full_pool {
                Some(source) => self.fetch_one(source.as_ref()).await?,
                None => return Ok(None),
            },
            Tier::LastResort => match &self.last_resort {
                Some(source) => self.fetch_one(source.as_ref()).await?,
                None => return Ok(None),
            },
            Tier::Exhausted => return Ok(None),
        };

        let items: Vec<ContentItem> = records
            .into_iter()
            .map(|raw| self.adapter.adapt(raw))
            .collect();

        if !items.iter().any(|item| item.key().is_some()) {
            return Err(SourceError::EmptyPool { tier });
        }

        Ok(Some(items))
    }

    /// Deadline in whole milliseconds, saturating for durations beyond `u64`
    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.fetch_timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Fetches one source under the chain's deadline
    ///
    /// On timeout the fetch future is dropped, which cancels the in-flight request.
    async fn fetch_one(&self, source: &dyn CandidateSource) -> Result<Vec<Value>, SourceError> {
        let timeout_ms = self.timeout_ms();

        match tokio::time::timeout(self.fetch_timeout, source.fetch()).await {
            Ok(Ok(records)) => Ok(records),
            Ok(Err(e)) => Err(SourceError::from_fetch(&source.name(), timeout_ms, e)),
            Err(_) => Err(SourceError::Timeout {
                source_name: source.name(),
                timeout_ms,
            }),
        }
    }

    /// Fetches all secondary sources concurrently and concatenates the successes
    ///
    /// Results are merged in configured order regardless of completion order. The tier
    /// only fails if every secondary source fails.
    async fn fetch_merged(&self) -> Result<Vec<Value>, SourceError> {
        let results = join_all(
            self.secondary
                .iter()
                .map(|source| self.fetch_one(source.as_ref())),
        )
        .await;

        let mut merged = Vec::new();
        let mut succeeded = 0;
        let mut last_error = None;

        for result in results {
            match result {
                Ok(records) => {
                    succeeded += 1;
                    merged.extend(records);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Secondary source failed");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if succeeded == 0 => Err(e),
            Some(_) => {
                tracing::warn!(
                    success_count = succeeded,
                    error_count = self.secondary.len() - succeeded,
                    "Partial secondary fetch failure"
                );
                Ok(merged)
            }
            None => Ok(merged),
        }
    }
}
