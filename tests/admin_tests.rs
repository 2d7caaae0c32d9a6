use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fanbroj::config::Config;
use fanbroj::domain::now_millis;
use fanbroj::entities::{payments, prelude::*};
use fanbroj::state::SharedState;
use http_body_util::BodyExt;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};
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

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-Api-Key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
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

async fn start_payment(app: &Router, device_id: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/pay",
            &json!({ "device_id": device_id, "plan": "weekly" }),
            false,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["order_id"].as_str().unwrap().to_string()
}

async fn identify(app: &Router, device_id: &str) -> i64 {
    let (_, body) = send(
        app,
        post_json(
            "/api/users/identify",
            &json!({ "device_id": device_id }),
            false,
        ),
    )
    .await;
    body["data"]["user"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_payments_listing_pages_and_explains() {
    let (app, shared) = spawn_app().await;

    let stale = start_payment(&app, "pay-1").await;
    let declined = start_payment(&app, "pay-2").await;
    start_payment(&app, "pay-3").await;

    let (_, body) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "order_id": declined, "status": "declined", "message": "Insufficient funds" }),
            false,
        ),
    )
    .await;
    assert_eq!(body["data"]["outcome"], "failed");

    Payments::update_many()
        .col_expr(
            payments::Column::CreatedAt,
            Expr::value(now_millis() - 60 * 60 * 1000),
        )
        .filter(payments::Column::OrderId.eq(stale.as_str()))
        .exec(&shared.store.conn)
        .await
        .unwrap();

    let (status, body) = send(&app, admin_get("/api/admin/payments?limit=1&page=2")).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["total"], 3);
    assert_eq!(data["page"], 2);
    assert_eq!(data["total_pages"], 3);
    assert_eq!(data["items"].as_array().unwrap().len(), 1);
    assert_eq!(data["stats"]["all"], 3);
    assert_eq!(data["stats"]["pending"], 2);
    assert_eq!(data["stats"]["failed"], 1);
    assert_eq!(data["stats"]["stale_pending"], 1);

    let (_, body) = send(
        &app,
        admin_get(&format!("/api/admin/payments?search={declined}")),
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["order_id"], declined.as_str());
    assert_eq!(body["data"]["items"][0]["debug_reason"], "Insufficient funds");

    let (_, body) = send(&app, admin_get("/api/admin/payments?status=pending")).await;
    let pending = body["data"]["items"].as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert!(
        pending
            .iter()
            .all(|p| p["debug_reason"] == "Awaiting payment callback/verify")
    );

    let (status, body) = send(&app, admin_get("/api/admin/payments?page=999999999999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["page"], 100_000);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["total"], 3);

    let (status, _) = send(&app, admin_get("/api/admin/payments?status=refunded")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_subscribers_listing_pages_and_searches() {
    let (app, _) = spawn_app().await;

    let mut user_ids = Vec::new();
    for (device, plan) in [("sub-1", "weekly"), ("sub-2", "monthly"), ("sub-3", "yearly")] {
        let user_id = identify(&app, device).await;
        let (status, _) = send(
            &app,
            post_json(
                "/api/admin/subscribers",
                &json!({ "user_id": user_id, "plan": plan }),
                true,
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        user_ids.push(user_id);
    }

    let (status, body) = send(&app, admin_get("/api/admin/subscribers?limit=2&page=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (_, body) = send(&app, admin_get("/api/admin/subscribers?search=monthly")).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["plan"], "monthly");

    let (_, body) = send(
        &app,
        admin_get(&format!("/api/admin/subscribers?search={}", user_ids[2])),
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["user_id"], user_ids[2]);
    assert_eq!(body["data"]["items"][0]["device_count"], 1);

    let (_, body) = send(&app, admin_get("/api/admin/subscribers?status=revoked")).await;
    assert_eq!(body["data"]["total"], 0);

    let (status, body) = send(
        &app,
        admin_get("/api/admin/subscribers?page=999999999999&limit=500"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["limit"], 100);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 0);
}
