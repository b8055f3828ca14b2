use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidmix_api::{
    api::{create_router, AppState},
    config::Config,
    error::{AppError, AppResult},
    models::SelectionRequest,
    services::{sources::CandidateSource, FallbackChain, FieldAdapter},
};

/// In-memory source returning a fixed list, or failing when `records` is `None`
struct FixedSource {
    name: &'static str,
    records: Option<Vec<Value>>,
}

#[async_trait::async_trait]
impl CandidateSource for FixedSource {
    async fn fetch(&self) -> AppResult<Vec<Value>> {
        self.records
            .clone()
            .ok_or_else(|| AppError::ExternalApi(format!("{} unavailable", self.name)))
    }

    fn name(&self) -> String {
        self.name.to_string()
    }
}

fn catalogue() -> Vec<Value> {
    vec![
        json!({ "id": "a1", "channel_id": "A", "title": "Ownership" }),
        json!({ "id": "a2", "channel_id": "A", "title": "Borrowing" }),
        json!({ "id": "a3", "channel_id": "A", "title": "Lifetimes" }),
        json!({ "id": "b1", "channel_id": "B", "title": "Tokio" }),
        json!({ "id": "b2", "channel_id": "B", "title": "Axum" }),
        json!({ "id": "c1", "channelId": "C", "title": "Serde" }),
        json!({ "videoId": "d1", "title": "No channel" }),
    ]
}

fn create_test_server(chain: FallbackChain) -> TestServer {
    let state = AppState::new(
        chain,
        Arc::new(FieldAdapter::default()),
        SelectionRequest {
            target: 4,
            ..SelectionRequest::default()
        },
        50,
    );
    TestServer::new(create_router(state)).unwrap()
}

fn chain() -> FallbackChain {
    FallbackChain::new(Arc::new(FieldAdapter::default()), Duration::from_secs(2))
}

fn ids(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| {
            item.get("id")
                .or_else(|| item.get("videoId"))
                .and_then(Value::as_str)
                .unwrap()
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(chain());
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_home_feed_is_channel_diversified() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: Some(catalogue()),
    })));

    let response = server.get("/api/v1/feeds/home").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["a1", "b1", "c1", "d1"]);
    assert_eq!(body["tier"], "primary");
    assert_eq!(body["final_cap"], 1);
    assert_eq!(body["backfilled"], 0);
    assert_eq!(body["error"], Value::Null);
    assert_eq!(body["items"][0]["title"], "Ownership");
}

#[tokio::test]
async fn test_feed_query_overrides_relax_and_backfill() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: Some(catalogue()),
    })));

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("target", 7)
        .add_query_param("relax", 0)
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["a1", "b1", "c1", "d1", "a2", "a3", "b2"]);
    assert_eq!(body["final_cap"], 1);
    assert_eq!(body["backfilled"], 3);
}

#[tokio::test]
async fn test_related_feed_excludes_current_video() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: Some(catalogue()),
    })));

    let response = server
        .get("/api/v1/feeds/related")
        .add_query_param("exclude", "a1,b1")
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["a2", "b2", "c1", "d1"]);
}

#[tokio::test]
async fn test_discover_feed_reproducible_with_seed() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: Some(catalogue()),
    })));

    let first: Value = server
        .get("/api/v1/feeds/discover")
        .add_query_param("seed", 2024)
        .await
        .json();
    let second: Value = server
        .get("/api/v1/feeds/discover")
        .add_query_param("seed", 2024)
        .await
        .json();

    assert_eq!(first["seed"], 2024);
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(ids(&first).len(), 4);
}

#[tokio::test]
async fn test_feed_falls_back_past_failed_tiers() {
    let server = create_test_server(
        chain()
            .with_primary(Arc::new(FixedSource {
                name: "primary",
                records: None,
            }))
            .with_secondary(Arc::new(FixedSource {
                name: "music",
                records: None,
            }))
            .with_secondary(Arc::new(FixedSource {
                name: "gaming",
                records: Some(vec![json!({ "id": "g1", "channel_id": "G" })]),
            })),
    );

    let body: Value = server.get("/api/v1/feeds/home").await.json();

    assert_eq!(body["tier"], "secondary_merged");
    assert_eq!(ids(&body), vec!["g1"]);
}

#[tokio::test]
async fn test_exhausted_feed_returns_empty_list_with_reason() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: None,
    })));

    let response = server.get("/api/v1/feeds/trending").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["tier"], "exhausted");
    assert!(body["error"].as_str().unwrap().contains("primary unavailable"));
}

#[tokio::test]
async fn test_unknown_feed_is_not_found() {
    let server = create_test_server(chain());
    let response = server.get("/api/v1/feeds/shorts").await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_target_rejected() {
    let server = create_test_server(chain());

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("target", 0)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("target", 51)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_huge_relaxation_parameters_rejected() {
    let server = create_test_server(chain().with_primary(Arc::new(FixedSource {
        name: "primary",
        records: Some(vec![
            json!({ "id": "a1", "channel_id": "A" }),
            json!({ "id": "b1", "channel_id": "B" }),
        ]),
    })));

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("target", 5)
        .add_query_param("relax", u64::MAX)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("cap", u64::MAX)
        .add_query_param("relax", 1)
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .get("/api/v1/feeds/home")
        .add_query_param("target", 5)
        .add_query_param("relax", 50)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["a1", "b1"]);
    assert_eq!(body["final_cap"], 1);
}

#[tokio::test]
async fn test_select_over_supplied_pools() {
    let server = create_test_server(chain());

    let response = server
        .post("/api/v1/select")
        .json(&json!({
            "request": { "target": 3 },
            "pools": [
                [],
                [
                    { "id": "x1", "channel_id": "X" },
                    { "id": "x2", "channel_id": "X" },
                    { "id": "x1", "channel_id": "X" },
                    { "id": "x3", "channel_id": "X" }
                ]
            ]
        }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(ids(&body), vec!["x1", "x2", "x3"]);
    assert_eq!(body["pool"], 1);
    assert_eq!(body["final_cap"], 2);
    assert_eq!(body["backfilled"], 1);
}

#[tokio::test]
async fn test_select_rejects_unknown_body_fields() {
    let server = create_test_server(chain());

    let response = server
        .post("/api/v1/select")
        .json(&json!({
            "requst": { "target": 3 },
            "pools": [[{ "id": "x1", "channel_id": "X" }]]
        }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_select_rejects_unbounded_relaxation() {
    let server = create_test_server(chain());

    let response = server
        .post("/api/v1/select")
        .json(&json!({
            "request": { "target": 5, "cap": u64::MAX, "relax": 1 },
            "pools": [[{ "id": "x1", "channel_id": "X" }]]
        }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_select_with_no_usable_pool() {
    let server = create_test_server(chain());

    let response = server
        .post("/api/v1/select")
        .json(&json!({ "pools": [[{ "title": "no id" }]] }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["items"], json!([]));
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server(chain());
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_configured_http_sources_fall_back_end_to_end() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/recommended"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [
                { "id": "v1", "channel": { "id": "UC1" } },
                { "id": "v2", "channel": { "id": "UC1" } },
                { "id": "v3", "channel": { "id": "UC2" } }
            ]
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/popular"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&upstream)
        .await;

    let config: Config = envy::from_iter(vec![
        (
            "PRIMARY_SOURCE_URL".to_string(),
            format!("{}/recommended", upstream.uri()),
        ),
        (
            "FULL_POOL_SOURCE_URL".to_string(),
            format!("{}/catalogue", upstream.uri()),
        ),
        (
            "LAST_RESORT_SOURCE_URL".to_string(),
            format!("{}/popular", upstream.uri()),
        ),
        ("DEFAULT_TARGET".to_string(), "3".to_string()),
        ("FETCH_TIMEOUT_MS".to_string(), "2000".to_string()),
    ])
    .unwrap();

    let state = AppState::from_config(&config).unwrap();
    let server = TestServer::new(create_router(state)).unwrap();

    let body: Value = server.get("/api/v1/feeds/home").await.json();

    assert_eq!(body["tier"], "full_pool");
    assert_eq!(ids(&body), vec!["v1", "v2", "v3"]);
    assert_eq!(body["backfilled"], 0);
    assert_eq!(body["final_cap"], 2);
}
