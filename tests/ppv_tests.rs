use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fanbroj::config::Config;
use fanbroj::db::repositories::ppv::NewPurchase;
use fanbroj::domain::{AccessType, ContentType, now_millis};
use fanbroj::entities::{ad_impressions, ppv_purchases, prelude::*};
use fanbroj::state::SharedState;
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

async fn spawn_app() -> (Router, Arc<SharedState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();

    let shared = Arc::new(
        SharedState::new(config)
            .await
            .expect("Failed to create shared state"),
    );
    let state = fanbroj::api::create_app_state(shared.clone(), None).await;
    (fanbroj::api::router(state).await, shared)
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

fn post_json(uri: &str, body: &Value, admin: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if admin {
        builder = builder.header("X-Api-Key", DEFAULT_API_KEY);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn configure(app: &Router, content_id: &str, min_ads: i32, ad_supported: bool) -> i64 {
    let (status, body) = send(
        app,
        post_json(
            "/api/ppv/configs",
            &json!({
                "content_type": "match",
                "content_id": content_id,
                "title": "Derby",
                "price": 0.5,
                "ad_supported_enabled": ad_supported,
                "min_ads_required": min_ads,
                "access_duration_hours": 24
            }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_i64().unwrap()
}

async fn watch_ad(app: &Router, user_id: i32, content_id: &str) -> (StatusCode, Value) {
    send(
        app,
        post_json(
            "/api/ppv/ad-watch",
            &json!({
                "user_id": user_id,
                "device_id": "dev-ppv",
                "content_type": "match",
                "content_id": content_id
            }),
            false,
        ),
    )
    .await
}

async fn access(app: &Router, user_id: i32, content_id: &str) -> Value {
    let (status, body) = send(
        app,
        get(&format!(
            "/api/ppv/access?content_type=match&content_id={content_id}&user_id={user_id}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"].clone()
}

async fn purchases_for(shared: &SharedState, user_id: i32) -> Vec<ppv_purchases::Model> {
    PpvPurchases::find()
        .filter(ppv_purchases::Column::UserId.eq(user_id))
        .all(&shared.store.conn)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_ads_unlock_at_threshold() {
    let (app, _) = spawn_app().await;
    configure(&app, "77", 2, true).await;

    let before = access(&app, 1, "77").await;
    assert_eq!(before["has_access"], false);
    assert_eq!(before["gate"]["state"], "locked");
    assert_eq!(before["gate"]["watched"], 0);
    assert_eq!(before["gate"]["required"], 2);

    let (status, first) = watch_ad(&app, 1, "77").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["ads_watched"], 1);
    assert_eq!(first["data"]["is_unlocked"], false);
    assert_eq!(first["data"]["gate"]["state"], "locked");

    let midway = access(&app, 1, "77").await;
    assert_eq!(midway["has_access"], false);
    assert_eq!(midway["ads_watched"], 1);

    let (_, second) = watch_ad(&app, 1, "77").await;
    assert_eq!(second["data"]["ads_watched"], 2);
    assert_eq!(second["data"]["is_unlocked"], true);
    assert_eq!(second["data"]["gate"]["state"], "unlocked");
    assert!(second["data"]["expires_at"].as_i64().unwrap() > now_millis());

    let after = access(&app, 1, "77").await;
    assert_eq!(after["has_access"], true);
    assert_eq!(after["access_type"], "ad_supported");

    // Watching more while unlocked does not count.
    let (_, extra) = watch_ad(&app, 1, "77").await;
    assert_eq!(extra["data"]["is_unlocked"], true);
    assert_eq!(extra["data"]["ads_watched"], 2);
}

#[tokio::test]
async fn test_expired_unlock_restarts_from_zero() {
    let (app, shared) = spawn_app().await;
    let config_id = configure(&app, "88", 2, true).await;

    shared
        .store
        .ppv()
        .insert_purchase(NewPurchase {
            user_id: 5,
            content_type: ContentType::Match,
            content_id: "88".to_string(),
            ppv_content_id: i32::try_from(config_id).unwrap(),
            price: 0.0,
            access_type: AccessType::AdSupported,
            ads_watched: 2,
            expires_at: now_millis() - 1_000,
        })
        .await
        .unwrap();

    let lapsed = access(&app, 5, "88").await;
    assert_eq!(lapsed["has_access"], false);
    assert_eq!(lapsed["ads_watched"], 0);
    assert_eq!(lapsed["gate"]["state"], "expired");

    let (_, first) = watch_ad(&app, 5, "88").await;
    assert_eq!(first["data"]["ads_watched"], 1);
    assert_eq!(first["data"]["is_unlocked"], false);

    let (_, second) = watch_ad(&app, 5, "88").await;
    assert_eq!(second["data"]["is_unlocked"], true);

    // The lapsed unlock stays on record next to the new one.
    let rows = purchases_for(&shared, 5).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.iter().filter(|p| p.expires_at > now_millis()).count(), 1);
}

#[tokio::test]
async fn test_expired_paid_purchase_is_not_overwritten() {
    let (app, shared) = spawn_app().await;
    let config_id = configure(&app, "99", 1, true).await;

    shared
        .store
        .ppv()
        .insert_purchase(NewPurchase {
            user_id: 9,
            content_type: ContentType::Match,
            content_id: "99".to_string(),
            ppv_content_id: i32::try_from(config_id).unwrap(),
            price: 0.5,
            access_type: AccessType::Paid,
            ads_watched: 0,
            expires_at: now_millis() - 1_000,
        })
        .await
        .unwrap();

    let (_, result) = watch_ad(&app, 9, "99").await;
    assert_eq!(result["data"]["is_unlocked"], true);

    let rows = purchases_for(&shared, 9).await;
    assert_eq!(rows.len(), 2);
    let paid = rows.iter().find(|p| p.access_type == "paid").unwrap();
    assert!((paid.price - 0.5).abs() < f64::EPSILON);
    assert!(paid.expires_at < now_millis());
    assert!(rows.iter().any(|p| p.access_type == "ad_supported"));

    let (_, stats) = send(
        &app,
        Request::builder()
            .uri("/api/ppv/stats")
            .header("X-Api-Key", DEFAULT_API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(stats["data"]["paid"], 1);
    assert_eq!(stats["data"]["ad_supported"], 1);
}

#[tokio::test]
async fn test_ad_support_disabled_is_forbidden() {
    let (app, _) = spawn_app().await;
    configure(&app, "55", 3, false).await;

    let (status, body) = watch_ad(&app, 1, "55").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = watch_ad(&app, 1, "no-such-content").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stats_count_purchases_not_configs() {
    let (app, _) = spawn_app().await;
    configure(&app, "1", 1, true).await;
    configure(&app, "2", 1, true).await;
    configure(&app, "3", 1, true).await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/ppv/purchase",
            &json!({ "user_id": 4, "content_type": "match", "content_id": "1" }),
            false,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(
        &app,
        Request::builder()
            .uri("/api/ppv/stats")
            .header("X-Api-Key", DEFAULT_API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(stats["data"]["total"], 1);
    assert_eq!(stats["data"]["active"], 1);
    assert_eq!(stats["data"]["paid"], 1);
    assert_eq!(stats["data"]["total_revenue"], 0.5);
}

#[tokio::test]
async fn test_ad_watch_records_device_on_impression() {
    let (app, shared) = spawn_app().await;
    configure(&app, "66", 3, true).await;

    watch_ad(&app, 3, "66").await;

    let impressions = AdImpressions::find()
        .filter(ad_impressions::Column::UserId.eq(3))
        .all(&shared.store.conn)
        .await
        .unwrap();
    assert_eq!(impressions.len(), 1);
    assert_eq!(impressions[0].device_id.as_deref(), Some("dev-ppv"));
    assert_eq!(impressions[0].ad_type, "ppv_unlock");
}
