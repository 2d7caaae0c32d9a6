use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode},
    routing::get,
};
use fanbroj::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

/// What the fake API-Football saw on each call.
struct Upstream {
    calls: Mutex<Vec<(HashMap<String, String>, Option<String>)>>,
    body: Value,
}

async fn fake_fixtures(
    State(upstream): State<Arc<Upstream>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<Value> {
    let key = headers
        .get("x-apisports-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    upstream.calls.lock().unwrap().push((query, key));
    Json(upstream.body.clone())
}

async fn spawn_upstream(body: Value) -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream {
        calls: Mutex::default(),
        body,
    });
    let app = Router::new()
        .route("/fixtures", get(fake_fixtures))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), upstream)
}

async fn spawn_app(base_url: &str) -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.fixtures.api_base_url = base_url.to_string();
    config.fixtures.api_key = "test-key".to_string();

    let state = fanbroj::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    fanbroj::api::router(state).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn admin(method: &str, uri: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY);
    match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn api_fixture(id: i64, league: &str, home: &str, away: &str, short: &str) -> Value {
    json!({
        "fixture": {
            "id": id,
            "date": "2026-03-14T19:00:00+03:00",
            "timestamp": 1_773_504_000,
            "timezone": "Africa/Mogadishu",
            "status": { "long": "First Half", "short": short }
        },
        "league": { "id": 39, "name": league, "logo": null },
        "teams": {
            "home": { "name": home, "logo": null },
            "away": { "name": away, "logo": null }
        }
    })
}

#[tokio::test]
async fn test_sync_keeps_allowed_leagues_only() {
    let (base_url, upstream) = spawn_upstream(json!({
        "errors": [],
        "response": [
            api_fixture(1001, "Premier League", "Arsenal", "Chelsea", "1H"),
            api_fixture(1002, "Serie Z", "Foo", "Bar", "NS"),
        ]
    }))
    .await;
    let app = spawn_app(&base_url).await;

    let (status, _) = send(
        &app,
        admin(
            "POST",
            "/api/fixtures/leagues",
            Some(&json!({ "league_name": "Premier League", "api_league_id": 39 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, admin("POST", "/api/fixtures/sync?mode=today", None)).await;
    assert_eq!(status, StatusCode::OK);
    let outcome = &body["data"][0];
    assert_eq!(outcome["ok"], true);
    assert_eq!(outcome["fetched"], 2);
    assert_eq!(outcome["imported"], 1);
    assert_eq!(outcome["skipped"], 1);
    let date = outcome["date"].as_str().unwrap().to_string();

    {
        let calls = upstream.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (query, key) = &calls[0];
        assert_eq!(query.get("date"), Some(&date));
        assert_eq!(query.get("timezone").map(String::as_str), Some("Africa/Mogadishu"));
        assert_eq!(key.as_deref(), Some("test-key"));
    }

    let (_, body) = send(&app, admin("GET", "/api/fixtures?view=all", None)).await;
    let fixtures = body["data"].as_array().unwrap();
    assert_eq!(fixtures.len(), 1);
    let slug = format!("arsenal-vs-chelsea-{}", date.replace('-', ""));
    assert_eq!(fixtures[0]["slug"], slug.as_str());
    assert_eq!(fixtures[0]["status"], "live");
    assert_eq!(fixtures[0]["kickoff_at"], 1_773_504_000_000_i64);
    let fixture_id = fixtures[0]["id"].as_i64().unwrap();

    // Same fixture again is an update, not a duplicate.
    let (_, body) = send(&app, admin("POST", "/api/fixtures/sync?mode=today", None)).await;
    assert_eq!(body["data"][0]["imported"], 0);
    assert_eq!(body["data"][0]["updated"], 1);

    let (_, body) = send(&app, admin("GET", "/api/fixtures/sync-logs", None)).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let import = json!({ "fixture_ids": [fixture_id] });
    let (_, body) = send(&app, admin("POST", "/api/fixtures/import", Some(&import))).await;
    assert_eq!(body["data"][0]["created"], true);
    assert_eq!(body["data"][0]["match"]["slug"], slug.as_str());
    assert_eq!(body["data"][0]["match"]["title"], "Arsenal vs Chelsea");

    let (_, body) = send(&app, admin("POST", "/api/fixtures/import", Some(&import))).await;
    assert_eq!(body["data"][0]["created"], false);
}

#[tokio::test]
async fn test_sync_reports_upstream_errors() {
    let (base_url, _) = spawn_upstream(json!({
        "errors": { "token": "Error/Missing application key" },
        "response": []
    }))
    .await;
    let app = spawn_app(&base_url).await;

    let (status, _) = send(&app, admin("POST", "/api/fixtures/sync?mode=today", None)).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = send(&app, admin("GET", "/api/fixtures/sync-logs", None)).await;
    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0]["ok"], false);
    assert!(logs[0]["error"].as_str().unwrap().contains("Missing application key"));
}
