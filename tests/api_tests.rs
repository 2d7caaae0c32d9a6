use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fanbroj::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Default API key seeded by migration (must match constants::auth::DEFAULT_API_KEY)
const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

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

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
}

fn admin_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_auth_endpoints() {
    let app = spawn_app().await;

    let (status, _) = send(&app, get("/api/system/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::builder()
            .uri("/api/system/status")
            .header("X-Api-Key", "wrong-key")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, admin_get("/api/system/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"], true);
    assert_eq!(body["data"]["scheduler_running"], false);
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "username": "admin", "password": "nope" }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "username": "", "password": "x" }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_movie_lifecycle() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        admin_json(
            "POST",
            "/api/movies",
            &json!({
                "slug": "hanti-iyo-hiyi",
                "title": "Hanti iyo Hiyi",
                "overview": "A family drama.",
                "genres": ["Drama"],
                "is_dubbed": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["views"], 0);
    assert!(body["data"]["seo_title"].as_str().unwrap().contains("Hanti iyo Hiyi"));

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            "/api/movies",
            &json!({ "slug": "hanti-iyo-hiyi", "title": "Again" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, get("/api/movies/hanti-iyo-hiyi")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Hanti iyo Hiyi");

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/movies/hanti-iyo-hiyi/view")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get(&format!("/api/movies/id/{id}"))).await;
    assert_eq!(body["data"]["views"], 1);

    let (_, body) = send(&app, get("/api/movies?genre=Drama")).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(
        &app,
        admin_json(
            "PUT",
            &format!("/api/movies/id/{id}"),
            &json!({ "is_premium": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["is_premium"], true);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/movies/id/{id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri(format!("/api/movies/id/{id}"))
            .header("X-Api-Key", DEFAULT_API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/movies/hanti-iyo-hiyi")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_movie_write_requires_admin() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/movies")
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "slug": "x", "title": "X" }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_category_slug_rules() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            "/api/categories",
            &json!({ "name": "Bad", "slug": "Not A Slug" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            "/api/categories",
            &json!({ "name": "Kubadda Cagta", "slug": "kubadda-cagta" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            "/api/categories",
            &json!({ "name": "Duplicate", "slug": "kubadda-cagta" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, get("/api/categories/kubadda-cagta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Kubadda Cagta");
}

#[tokio::test]
async fn test_settings_update_is_validated() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        admin_json("PUT", "/api/settings", &json!({ "price_weekly": -1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        admin_json(
            "PUT",
            "/api/settings",
            &json!({ "price_weekly": 3.5, "max_devices_weekly": 2 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["price_weekly"], 3.5);

    let (_, body) = send(&app, get("/api/settings")).await;
    assert_eq!(body["data"]["max_devices_weekly"], 2);
}

#[tokio::test]
async fn test_unknown_job_is_rejected() {
    let app = spawn_app().await;

    let (status, _) = send(
        &app,
        admin_json("POST", "/api/system/jobs/not-a-job", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        admin_json("POST", "/api/system/jobs/expire-subscriptions", &json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["skipped"], false);
    assert_eq!(body["data"]["result"]["expired"], 0);
}

#[tokio::test]
async fn test_series_with_episodes() {
    let app = spawn_app().await;

    let (status, body) = send(
        &app,
        admin_json(
            "POST",
            "/api/series",
            &json!({
                "title": "Qalbi Jaban",
                "overview": "Drama taxane ah",
                "backdrop_url": "https://img.example/qalbi.jpg"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "qalbi-jaban");
    let series_id = body["data"]["id"].as_i64().unwrap();

    let (status, _) = send(
        &app,
        admin_json("POST", "/api/series", &json!({ "title": "Qalbi Jaban" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let episodes_uri = format!("/api/series/id/{series_id}/episodes");
    for (season, episode) in [(2, 1), (1, 2), (1, 1)] {
        let (status, _) = send(
            &app,
            admin_json(
                "POST",
                &episodes_uri,
                &json!({
                    "season_number": season,
                    "episode_number": episode,
                    "title": format!("S{season}E{episode}")
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        admin_json(
            "POST",
            &episodes_uri,
            &json!({ "season_number": 1, "episode_number": 1, "title": "Again" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "S01E01 already exists");

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            &episodes_uri,
            &json!({ "season_number": 0, "episode_number": 1, "title": "Pilot" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, get("/api/series/qalbi-jaban")).await;
    assert_eq!(status, StatusCode::OK);
    let seasons = body["data"]["seasons"].as_array().unwrap();
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0]["season_number"], 1);
    assert_eq!(seasons[0]["episodes"][0]["title"], "S1E1");
    assert_eq!(seasons[0]["episodes"][1]["title"], "S1E2");
    assert_eq!(seasons[1]["episodes"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["title"], "Qalbi Jaban");

    let (status, _) = send(
        &app,
        admin_json(
            "POST",
            "/api/hero-slides",
            &json!({ "content_type": "series", "content_id": "qalbi-jaban" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, get("/api/hero-slides")).await;
    let slide = &body["data"][0];
    assert_eq!(slide["title"], "Qalbi Jaban");
    assert_eq!(slide["image_url"], "https://img.example/qalbi.jpg");
    assert_eq!(slide["cta_link"], "/series/qalbi-jaban");

    let (status, _) = send(
        &app,
        admin_json(
            "DELETE",
            &format!("/api/series/id/{series_id}"),
            &json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, get("/api/series/qalbi-jaban")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get(&episodes_uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
