use std::sync::Arc;

use article_ranking::clock::ManualClock;
use article_ranking::config::Config;
use article_ranking::services::voting_engine::{EngineSettings, VotingEngine};
use article_ranking::{AppState, create_app};
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        port: 0,
        host: "127.0.0.1".to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        vote_window_secs: 604_800,
        vote_score: 432,
        articles_per_page: 25,
        group_cache_ttl_secs: 60,
        sweep_interval_secs: 60,
    }
}

fn app() -> (Router, Arc<ManualClock>) {
    let config = test_config();
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let engine = Arc::new(VotingEngine::new(config.engine_settings(), clock.clone()));
    let state = AppState {
        engine,
        config: Arc::new(config),
    };
    (create_app(state), clock)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_article(app: &Router, author: &str, vote_type: Value) -> u64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/articles",
        Some(json!({
            "author": author,
            "title": "A title",
            "link": "https://www.example.com",
            "vote_type": vote_type
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["article_id"].as_u64().unwrap()
}

#[tokio::test]
async fn post_and_fetch_article() {
    let (app, _) = app();
    let id = create_article(&app, "alice", json!(1)).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/articles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["author"], "alice");
    assert_eq!(body["votes"], 1);
    assert_eq!(body["upvotes"], 1);
    assert_eq!(body["score"], 1_700_000_000i64 + 432);
}

#[tokio::test]
async fn vote_outcomes_over_http() {
    let (app, _) = app();
    let id = create_article(&app, "alice", json!("upvote")).await;
    let uri = format!("/api/articles/{id}/vote");

    let (status, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({"user": "bob", "vote_type": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "accepted");
    assert_eq!(body["user_vote"], "downvote");
    assert_eq!(body["votes"], 2);
    assert_eq!(body["downvotes"], 1);

    let (_, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({"user": "bob", "vote_type": "upvote"})),
    )
    .await;
    assert_eq!(body["outcome"], "switched");
    assert_eq!(body["upvotes"], 2);
    assert_eq!(body["downvotes"], 0);

    let (_, body) = send(
        &app,
        Method::POST,
        &uri,
        Some(json!({"user": "bob", "vote_type": 1})),
    )
    .await;
    assert_eq!(body["outcome"], "no_op");
}

#[tokio::test]
async fn late_vote_is_rejected_not_an_error() {
    let (app, clock) = app();
    let id = create_article(&app, "alice", json!(1)).await;
    clock.advance(604_801);

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/articles/{id}/vote"),
        Some(json!({"user": "bob", "vote_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "rejected");
    assert_eq!(body["reason"], "too_late");
    assert_eq!(body["votes"], 1);
}

#[tokio::test]
async fn invalid_direction_is_bad_request() {
    let (app, _) = app();
    let id = create_article(&app, "alice", json!(1)).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/articles/{id}/vote"),
        Some(json!({"user": "bob", "vote_type": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/articles",
        Some(json!({
            "author": "alice",
            "title": "A title",
            "link": "https://www.example.com",
            "vote_type": "sideways"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_article_is_404() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/articles/77/vote",
        Some(json!({"user": "bob", "vote_type": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, Method::GET, "/api/articles/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_and_groups() {
    let (app, clock) = app();
    let a = create_article(&app, "alice", json!(1)).await;
    clock.advance(1);
    let b = create_article(&app, "bob", json!(-1)).await;

    let (status, body) = send(&app, Method::GET, "/api/articles?page=1", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<u64> = body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![a, b]);

    let (_, body) = send(&app, Method::GET, "/api/articles?order=time", None).await;
    assert_eq!(body["articles"][0]["id"].as_u64(), Some(b));

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/groups/new-group/articles",
        Some(json!({"article_id": b})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["added"], true);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/articles/{a}/groups"),
        Some(json!({"groups": ["new-group", "other"]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/groups/new-group/articles", None).await;
    let ids: Vec<u64> = body["articles"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_u64().unwrap())
        .collect();
    assert_eq!(ids, vec![a, b]);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/groups/other/articles/{a}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/groups/other/articles/{a}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn page_zero_is_bad_request() {
    let (app, _) = app();
    let (status, _) = send(&app, Method::GET, "/api/articles?page=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_article_over_http() {
    let (app, _) = app();
    let id = create_article(&app, "alice", json!(1)).await;

    let (status, _) = send(&app, Method::DELETE, &format!("/api/articles/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/articles", None).await;
    assert!(body["articles"].as_array().unwrap().is_empty());
}

#[test]
fn default_settings_match_config_defaults() {
    assert_eq!(test_config().engine_settings(), EngineSettings::default());
}
