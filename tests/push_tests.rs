use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fanbroj::config::Config;
use fanbroj::db::repositories::push::PushSubscription;
use fanbroj::domain::now_millis;
use fanbroj::services::push::{PushPayload, PushSender, SendOutcome};
use fanbroj::state::SharedState;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

/// Records every delivery; endpoints containing "gone" answer like a 410.
#[derive(Default)]
struct RecordingSender {
    delivered: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl PushSender for RecordingSender {
    async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> SendOutcome {
        if subscription.endpoint.contains("gone") {
            return SendOutcome::Gone;
        }
        self.delivered
            .lock()
            .unwrap()
            .push((subscription.endpoint.clone(), payload.title.clone()));
        SendOutcome::Delivered
    }
}

async fn spawn_app(enabled: bool) -> (Router, Arc<RecordingSender>) {
    let (app, sender, _) = spawn_app_with_state(enabled).await;
    (app, sender)
}

async fn spawn_app_with_state(
    enabled: bool,
) -> (Router, Arc<RecordingSender>, Arc<SharedState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.push.enabled = enabled;

    let sender = Arc::new(RecordingSender::default());
    let shared = Arc::new(
        SharedState::with_push_sender(config, sender.clone())
            .await
            .expect("Failed to create shared state"),
    );
    let state = fanbroj::api::create_app_state(shared.clone(), None).await;
    (fanbroj::api::router(state).await, sender, shared)
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

async fn subscribe(app: &Router, endpoint: &str, user_id: Option<i64>) -> StatusCode {
    let (status, _) = send(
        app,
        post_json(
            "/api/push",
            &json!({
                "action": "subscribe",
                "subscription": {
                    "endpoint": endpoint,
                    "keys": { "p256dh": "p256dh-key", "auth": "auth-secret" }
                },
                "user_id": user_id
            }),
            false,
        ),
    )
    .await;
    status
}

#[tokio::test]
async fn test_send_requires_admin() {
    let (app, sender) = spawn_app(true).await;
    assert_eq!(subscribe(&app, "endpoint-ok-1", None).await, StatusCode::OK);

    let send_action = json!({ "action": "send", "title": "Goal!", "body": "1-0" });

    let (status, _) = send(&app, post_json("/api/push", &send_action, false)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(sender.delivered.lock().unwrap().is_empty());

    let (status, body) = send(&app, post_json("/api/push", &send_action, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], 1);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(
        sender.delivered.lock().unwrap().as_slice(),
        &[("endpoint-ok-1".to_string(), "Goal!".to_string())]
    );
}

#[tokio::test]
async fn test_gone_endpoints_are_deactivated() {
    let (app, sender) = spawn_app(true).await;
    subscribe(&app, "endpoint-ok-1", None).await;
    subscribe(&app, "endpoint-gone-1", None).await;

    let send_action = json!({ "action": "send", "title": "News", "body": "Hello" });
    let (_, body) = send(&app, post_json("/api/push", &send_action, true)).await;
    assert_eq!(body["data"]["sent"], 1);
    assert_eq!(body["data"]["failed"], 1);
    assert_eq!(body["data"]["deactivated"], 1);

    let (_, body) = send(&app, post_json("/api/push", &send_action, true)).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(sender.delivered.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_disabled_push_sends_nothing() {
    let (app, sender) = spawn_app(false).await;
    subscribe(&app, "endpoint-ok-1", None).await;

    let send_action = json!({ "action": "send", "title": "News", "body": "Hello" });
    let (status, body) = send(&app, post_json("/api/push", &send_action, true)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 0);
    assert!(sender.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_subscribe_validation_and_unsubscribe() {
    let (app, _) = spawn_app(true).await;

    assert_eq!(subscribe(&app, "  ", None).await, StatusCode::BAD_REQUEST);
    assert_eq!(subscribe(&app, "endpoint-ok-1", None).await, StatusCode::OK);

    let (status, body) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/push?endpoint=endpoint-ok-1")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removed"], true);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("DELETE")
            .uri("/api/push")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_broadcast_skips_anonymous_subscriptions() {
    let (app, sender) = spawn_app(true).await;

    let (_, body) = send(
        &app,
        post_json("/api/users/identify", &json!({ "device_id": "dev-push" }), false),
    )
    .await;
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    subscribe(&app, "endpoint-viewer", Some(user_id)).await;
    subscribe(&app, "endpoint-anonymous", None).await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/notifications/broadcast",
            &json!({ "title": "Live now", "body": "Kick-off", "audience": "all" }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sent"], 1);

    let delivered = sender.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "endpoint-viewer");
    drop(delivered);

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api/notifications/history")
            .header("X-Api-Key", DEFAULT_API_KEY)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["sent_by"], "admin");
}

async fn identify(app: &Router, device_id: &str) -> Value {
    let (_, body) = send(
        app,
        post_json("/api/users/identify", &json!({ "device_id": device_id }), false),
    )
    .await;
    body["data"]["user"].clone()
}

async fn match_kicking_off_in(app: &Router, minutes: i64) -> i64 {
    let (status, body) = send(
        app,
        post_json(
            "/api/matches",
            &json!({
                "slug": "derby-reminder",
                "title": "Derby",
                "team_a": "Arsenal",
                "team_b": "Chelsea",
                "kickoff_at": now_millis() + minutes * 60 * 1000
            }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_match_reminder_is_sent_once() {
    let (app, sender, shared) = spawn_app_with_state(true).await;
    let match_id = match_kicking_off_in(&app, 17).await;
    let user_id = identify(&app, "dev-remind").await["id"].as_i64().unwrap();
    subscribe(&app, "endpoint-remind", Some(user_id)).await;

    let (_, body) = send(
        &app,
        post_json(
            "/api/notifications/reminders",
            &json!({ "match_id": match_id, "user_id": user_id, "device_id": "dev-remind" }),
            false,
        ),
    )
    .await;
    assert_eq!(body["data"]["status"], "added");

    let run = shared
        .notifications
        .send_match_reminders(now_millis())
        .await
        .unwrap();
    assert_eq!(run.matches, 1);
    assert_eq!(run.reminders, 1);
    assert_eq!(run.sent, 1);
    {
        let delivered = sender.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].0, "endpoint-remind");
    }

    let again = shared
        .notifications
        .send_match_reminders(now_millis())
        .await
        .unwrap();
    assert_eq!(again.reminders, 0);
    assert_eq!(sender.delivered.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_reminders_wait_while_push_is_disabled() {
    let (app, sender, shared) = spawn_app_with_state(false).await;
    let match_id = match_kicking_off_in(&app, 17).await;
    send(
        &app,
        post_json(
            "/api/notifications/reminders",
            &json!({ "match_id": match_id, "device_id": "dev-later" }),
            false,
        ),
    )
    .await;
    send(
        &app,
        post_json(
            "/api/push",
            &json!({
                "action": "subscribe",
                "subscription": {
                    "endpoint": "endpoint-later",
                    "keys": { "p256dh": "p256dh-key", "auth": "auth-secret" }
                },
                "device_id": "dev-later"
            }),
            false,
        ),
    )
    .await;

    let run = shared
        .notifications
        .send_match_reminders(now_millis())
        .await
        .unwrap();
    assert_eq!(run.reminders, 0);
    assert!(sender.delivered.lock().unwrap().is_empty());

    shared.config.write().await.push.enabled = true;

    let run = shared
        .notifications
        .send_match_reminders(now_millis())
        .await
        .unwrap();
    assert_eq!(run.reminders, 1);
}

#[tokio::test]
async fn test_trial_expiry_nudges_non_subscribers() {
    let (app, sender, shared) = spawn_app_with_state(true).await;

    let trial_user = identify(&app, "dev-trial").await;
    let trial_id = trial_user["id"].as_i64().unwrap();
    let trial_end = trial_user["trial_expires_at"].as_i64().unwrap();
    subscribe(&app, "endpoint-trial", Some(trial_id)).await;

    let paying_id = identify(&app, "dev-paying").await["id"].as_i64().unwrap();
    subscribe(&app, "endpoint-paying", Some(paying_id)).await;
    let (status, _) = send(
        &app,
        post_json(
            "/api/admin/subscribers",
            &json!({ "user_id": paying_id, "plan": "monthly" }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let day = 24 * 60 * 60 * 1000;
    let run = shared
        .notifications
        .check_trial_expiry(trial_end - 2 * day)
        .await
        .unwrap();
    assert_eq!(run.scanned, 2);
    assert_eq!(run.reminded, 1);
    assert_eq!(run.expired, 0);
    assert_eq!(
        sender.delivered.lock().unwrap().as_slice(),
        &[("endpoint-trial".to_string(), "🔥 3 days left!".to_string())]
    );

    let run = shared
        .notifications
        .check_trial_expiry(trial_end + day / 2)
        .await
        .unwrap();
    assert_eq!(run.expired, 1);
    assert_eq!(run.reminded, 0);
    let delivered = sender.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert_eq!(delivered[1].1, "❌ Trial ended");
}
