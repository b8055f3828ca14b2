use serde_json::Value;

use crate::{
    error::{AppError, AppResult, SourceError},
    models::{FeedResponse, SelectionRequest, SelectionResult, Tier},
    services::{adapter::ItemAdapter, fallback::FallbackChain, selection},
};

/// Outcome of one end-to-end feed request
///
/// "No data" is not an error here: an exhausted chain yields an empty result with the
/// cause attached so the client can offer a retry.
#[derive(Debug)]
pub struct Recommendation {
    pub tier: Option<Tier>,
    /// Index of the in-memory pool used by `select_from_pools`
    pub pool: Option<usize>,
    pub result: SelectionResult,
    pub error: Option<SourceError>,
}

impl From<Recommendation> for FeedResponse {
    fn from(recommendation: Recommendation) -> Self {
        let result = recommendation.result;
        Self {
            items: result.items.into_iter().map(|item| item.payload).collect(),
            tier: recommendation.tier,
            pool: recommendation.pool,
            final_cap: result.final_cap,
            backfilled: result.backfilled,
            seed: result.seed,
            error: recommendation.error.map(|e| e.to_string()),
        }
    }
}

/// Rejects requests the engine cannot meaningfully serve
pub fn validate_request(request: &SelectionRequest, max_target: usize) -> AppResult<()> {
    if request.target == 0 {
        return Err(AppError::InvalidInput(
            "target must be at least 1".to_string(),
        ));
    }
    if request.target > max_target {
        return Err(AppError::InvalidInput(format!(
            "target must not exceed {}",
            max_target
        )));
    }
    if request.initial_cap == 0 {
        return Err(AppError::InvalidInput(
            "cap must be at least 1".to_string(),
        ));
    }
    if request.initial_cap > max_target {
        return Err(AppError::InvalidInput(format!(
            "cap must not exceed {}",
            max_target
        )));
    }
    if request.max_relaxation_steps > max_target {
        return Err(AppError::InvalidInput(format!(
            "relax must not exceed {}",
            max_target
        )));
    }
    Ok(())
}

/// Resolves a candidate pool through the fallback chain and runs the selection engine
pub async fn recommend(chain: &FallbackChain, request: &SelectionRequest) -> Recommendation {
    match chain.resolve().await {
        Ok(pool) => {
            let result = selection::select(pool.items, request);

            tracing::info!(
                tier = %pool.tier,
                selected = result.items.len(),
                target = request.target,
                final_cap = result.final_cap,
                backfilled = result.backfilled,
                seed = ?result.seed,
                "Recommendation built"
            );

            Recommendation {
                tier: Some(pool.tier),
                pool: None,
                result,
                error: None,
            }
        }
        Err(e) => Recommendation {
            tier: Some(Tier::Exhausted),
            pool: None,
            result: SelectionResult::empty(),
            error: Some(e),
        },
    }
}

/// Runs the selection engine over pools the caller already fetched
///
/// Pools are tried in order like tiers; the first one containing at least one item
/// with an id is used.
pub fn select_from_pools(
    pools: Vec<Vec<Value>>,
    adapter: &dyn ItemAdapter,
    request: &SelectionRequest,
) -> Recommendation {
    let pool_count = pools.len();

    for (index, pool) in pools.into_iter().enumerate() {
        let items: Vec<_> = pool.into_iter().map(|raw| adapter.adapt(raw)).collect();

        if items.iter().any(|item| item.key().is_some()) {
            let result = selection::select(items, request);

            tracing::info!(
                pool = index,
                selected = result.items.len(),
                target = request.target,
                final_cap = result.final_cap,
                backfilled = result.backfilled,
                "Selection over supplied pools built"
            );

            return Recommendation {
                tier: None,
                pool: Some(index),
                result,
                error: None,
            };
        }

        tracing::debug!(pool = index, "Supplied pool has no usable candidates");
    }

    tracing::warn!(pools = pool_count, "No supplied pool had usable candidates");

    Recommendation {
        tier: None,
        pool: None,
        result: SelectionResult::empty(),
        error: Some(SourceError::Exhausted { last_cause: None }),
    }
}
