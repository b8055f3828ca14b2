use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    models::SelectionRequest,
    services::{sources::HttpSource, FallbackChain, FieldAdapter},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub chain: Arc<FallbackChain>,
    pub adapter: Arc<FieldAdapter>,
    /// Baseline request that feed presets build on
    pub defaults: SelectionRequest,
    pub max_target: usize,
}

impl AppState {
    pub fn new(
        chain: FallbackChain,
        adapter: Arc<FieldAdapter>,
        defaults: SelectionRequest,
        max_target: usize,
    ) -> Self {
        Self {
            chain: Arc::new(chain),
            adapter,
            defaults,
            max_target,
        }
    }

    /// Builds the HTTP fallback chain described by the configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let adapter = Arc::new(FieldAdapter::new(
            config.id_fields.clone(),
            config.channel_fields.clone(),
        ));
        let timeout = config.fetch_timeout();
        let mut chain = FallbackChain::new(adapter.clone(), timeout);

        if let Some(url) = &config.primary_source_url {
            chain = chain.with_primary(Arc::new(HttpSource::new("primary", url, timeout)?));
        }
        for (index, url) in config.secondary_source_urls.iter().enumerate() {
            let name = format!("secondary-{}", index + 1);
            chain = chain.with_secondary(Arc::new(HttpSource::new(name, url, timeout)?));
        }
        if let Some(url) = &config.full_pool_source_url {
            chain = chain.with_full_pool(Arc::new(HttpSource::new("full-pool", url, timeout)?));
        }
        if let Some(url) = &config.last_resort_source_url {
            chain = chain.with_last_resort(Arc::new(HttpSource::new("last-resort", url, timeout)?));
        }

        if chain.source_count() == 0 {
            tracing::warn!("No candidate sources configured; feeds will report exhaustion");
        }

        Ok(Self::new(
            chain,
            adapter,
            config.default_request(),
            config.max_target,
        ))
    }
}
