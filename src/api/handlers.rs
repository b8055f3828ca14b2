use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::{Feed, FeedResponse, SelectionRequest},
    services::recommendations,
};

use super::AppState;

// Request types

/// Per-request overrides of a feed's preset
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectionOptions {
    pub target: Option<usize>,
    pub cap: Option<usize>,
    /// Maximum relaxation steps
    pub relax: Option<usize>,
    pub shuffle: Option<bool>,
    pub seed: Option<u64>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SelectionOptions {
    pub fn apply(self, base: SelectionRequest) -> SelectionRequest {
        SelectionRequest {
            target: self.target.unwrap_or(base.target),
            initial_cap: self.cap.unwrap_or(base.initial_cap),
            max_relaxation_steps: self.relax.unwrap_or(base.max_relaxation_steps),
            // A seed only means something for a shuffled pool
            shuffle: self.shuffle.unwrap_or(base.shuffle) || self.seed.is_some(),
            seed: self.seed.or(base.seed),
            exclude: if self.exclude.is_empty() {
                base.exclude
            } else {
                self.exclude
            },
        }
    }
}

/// Query string form of `SelectionOptions`; `exclude` is comma separated
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub target: Option<usize>,
    pub cap: Option<usize>,
    pub relax: Option<usize>,
    pub shuffle: Option<bool>,
    pub seed: Option<u64>,
    pub exclude: Option<String>,
}

impl From<FeedQuery> for SelectionOptions {
    fn from(query: FeedQuery) -> Self {
        Self {
            target: query.target,
            cap: query.cap,
            relax: query.relax,
            shuffle: query.shuffle,
            seed: query.seed,
            exclude: query
                .exclude
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

/// Body of `POST /select`: `{ "request": {...}, "pools": [[...], ...] }`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SelectRequest {
    #[serde(default, alias = "options")]
    pub request: SelectionOptions,
    /// Candidate pools in priority order
    pub pools: Vec<Vec<Value>>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Builds a feed through the source fallback chain
///
/// Exhausted sources are not an HTTP error: the response carries an empty list and
/// the reason, and the client offers a retry.
pub async fn get_feed(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(feed): Path<String>,
    Query(query): Query<FeedQuery>,
) -> AppResult<Json<FeedResponse>> {
    let feed: Feed = feed.parse()?;
    let request = SelectionOptions::from(query).apply(feed.preset(&state.defaults));
    recommendations::validate_request(&request, state.max_target)?;

    tracing::info!(
        request_id = %request_id,
        feed = %feed,
        target = request.target,
        cap = request.initial_cap,
        shuffle = request.shuffle,
        "Processing feed request"
    );

    let recommendation = recommendations::recommend(&state.chain, &request).await;

    if let Some(error) = &recommendation.error {
        tracing::warn!(request_id = %request_id, feed = %feed, error = %error, "Feed request exhausted all sources");
    }

    Ok(Json(recommendation.into()))
}

/// Runs the selection engine over pools supplied by the caller
pub async fn select(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(body): Json<SelectRequest>,
) -> AppResult<Json<FeedResponse>> {
    let request = body.request.apply(state.defaults.clone());
    recommendations::validate_request(&request, state.max_target)?;

    tracing::info!(
        request_id = %request_id,
        pools = body.pools.len(),
        target = request.target,
        "Processing selection request"
    );

    let recommendation =
        recommendations::select_from_pools(body.pools, state.adapter.as_ref(), &request);

    Ok(Json(recommendation.into()))
}
