use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use fanbroj::config::Config;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

const DEFAULT_API_KEY: &str = "fanbroj_default_api_key_please_regenerate";

async fn spawn_app_with(config: Config) -> Router {
    let state = fanbroj::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    fanbroj::api::router(state).await
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config
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

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn create_premium_movie(app: &Router, slug: &str) {
    let (status, _) = send(
        app,
        Request::builder()
            .method("POST")
            .uri("/api/movies")
            .header("X-Api-Key", DEFAULT_API_KEY)
            .header("Content-Type", "application/json")
            .body(Body::from(
                json!({ "slug": slug, "title": "Premium Film", "is_premium": true }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_identify_is_idempotent_and_grants_trial() {
    let app = spawn_app_with(test_config()).await;

    let (status, first) = send(
        &app,
        post_json("/api/users/identify", &json!({ "device_id": "dev-trial" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["is_new"], true);
    assert!(first["data"]["user"]["trial_expires_at"].is_i64());

    let (_, second) = send(
        &app,
        post_json("/api/users/identify", &json!({ "device_id": "dev-trial" })),
    )
    .await;
    assert_eq!(second["data"]["is_new"], false);
    assert_eq!(second["data"]["user"]["id"], first["data"]["user"]["id"]);

    create_premium_movie(&app, "premium-film").await;

    let (status, body) = send(
        &app,
        get("/api/access/premium?device_id=dev-trial&content_type=movie&slug=premium-film"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["has_access"], true);
    assert_eq!(body["data"]["reason"], "trial");
}

#[tokio::test]
async fn test_unknown_device_has_no_access() {
    let app = spawn_app_with(test_config()).await;

    let (status, body) = send(
        &app,
        get("/api/access/premium?device_id=nobody&content_type=movie&slug=anything"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["has_access"], false);
    assert_eq!(body["data"]["reason"], "no_user");

    let (status, _) = send(&app, get("/api/access/premium?content_type=movie")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, get("/api/subscriptions/me?device_id=nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_trial_is_denied() {
    let mut config = test_config();
    config.subscriptions.trial_days = 0;
    let app = spawn_app_with(config).await;

    send(
        &app,
        post_json("/api/users/identify", &json!({ "device_id": "dev-no-trial" })),
    )
    .await;

    let (_, body) = send(
        &app,
        get("/api/access/premium?device_id=dev-no-trial&content_type=movie&slug=film"),
    )
    .await;
    assert_eq!(body["data"]["has_access"], false);
    assert_eq!(body["data"]["reason"], "no_active_subscription");
}

#[tokio::test]
async fn test_payment_webhook_creates_subscription_once() {
    let app = spawn_app_with(test_config()).await;

    let (status, body) = send(
        &app,
        post_json("/api/pay", &json!({ "device_id": "dev-pay", "plan": "monthly" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "pending");
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "orderId": order_id, "status": "SUCCESS", "sid": "gw-1" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "completed");
    assert!(body["data"]["access_code"].is_string());

    let (_, body) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "order_id": order_id, "status": "success" }),
        ),
    )
    .await;
    assert_eq!(body["data"]["outcome"], "already_processed");

    let (status, body) = send(&app, get("/api/subscriptions/me?device_id=dev-pay")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscription"]["plan"], "monthly");
    assert_eq!(body["data"]["devices"].as_array().unwrap().len(), 1);

    let (_, body) = send(
        &app,
        get("/api/access/premium?device_id=dev-pay&content_type=movie&slug=any"),
    )
    .await;
    assert_eq!(body["data"]["reason"], "subscription");
    assert_eq!(body["data"]["plan"], "monthly");
}

#[tokio::test]
async fn test_failed_payment_is_recorded() {
    let app = spawn_app_with(test_config()).await;

    let (_, body) = send(
        &app,
        post_json("/api/pay", &json!({ "device_id": "dev-fail", "plan": "weekly" })),
    )
    .await;
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "order_id": order_id, "status": "declined" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "failed");

    let (status, _) = send(
        &app,
        post_json("/api/pay/webhook", &json!({ "status": "success" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "order_id": "missing", "status": "success" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_webhook_secret_is_enforced() {
    let mut config = test_config();
    config.payments.webhook_secret = Some("s3cret".to_string());
    let app = spawn_app_with(config).await;

    let (status, _) = send(
        &app,
        post_json(
            "/api/pay/webhook",
            &json!({ "order_id": "any", "status": "success" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/pay/webhook")
            .header("Content-Type", "application/json")
            .header("X-Webhook-Secret", "s3cret")
            .body(Body::from(
                json!({ "order_id": "any", "status": "success" }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
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

async fn identify(app: &Router, device_id: &str) -> i64 {
    let (status, body) = send(
        app,
        post_json("/api/users/identify", &json!({ "device_id": device_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["data"]["user"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_device_cap_applies_with_and_without_subscription() {
    let app = spawn_app_with(test_config()).await;
    let user_id = identify(&app, "dev-a").await;

    // No subscription: one device only.
    let (status, body) = send(
        &app,
        post_json("/api/devices", &json!({ "user_id": user_id, "device_id": "dev-b" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("1/1"));

    let (status, _) = send(
        &app,
        admin(
            "POST",
            "/api/admin/subscribers",
            Some(&json!({ "user_id": user_id, "plan": "weekly", "max_devices": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json("/api/devices", &json!({ "user_id": user_id, "device_id": "dev-b" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json("/api/devices", &json!({ "user_id": user_id, "device_id": "dev-c" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, admin("DELETE", "/api/admin/devices?all=1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deleted_count"], 2);

    let (_, body) = send(
        &app,
        admin("GET", &format!("/api/admin/devices?user_id={user_id}"), None),
    )
    .await;
    assert_eq!(body["data"]["devices"].as_array().unwrap().len(), 0);
    assert_eq!(body["data"]["limit"]["current_count"], 0);
    assert_eq!(body["data"]["limit"]["max_allowed"], 2);

    let (status, _) = send(
        &app,
        post_json("/api/devices", &json!({ "user_id": user_id, "device_id": "dev-c" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_concurrent_webhooks_fulfil_once() {
    let app = spawn_app_with(test_config()).await;

    let (_, body) = send(
        &app,
        post_json("/api/pay", &json!({ "device_id": "dev-race", "plan": "weekly" })),
    )
    .await;
    let order_id = body["data"]["order_id"].as_str().unwrap().to_string();
    let callback = json!({ "order_id": order_id, "status": "success", "sid": "gw-9" });

    let (first, second) = tokio::join!(
        send(&app, post_json("/api/pay/webhook", &callback)),
        send(&app, post_json("/api/pay/webhook", &callback)),
    );
    assert_eq!(first.0, StatusCode::OK);
    assert_eq!(second.0, StatusCode::OK);

    let mut outcomes = vec![
        first.1["data"]["outcome"].as_str().unwrap().to_string(),
        second.1["data"]["outcome"].as_str().unwrap().to_string(),
    ];
    outcomes.sort();
    assert_eq!(outcomes, vec!["already_processed", "completed"]);

    let (_, body) = send(&app, admin("GET", "/api/admin/subscribers", None)).await;
    assert_eq!(body["data"]["total"], 1);

    // The access code handed out is a redemption code issued for the payment.
    let completed = if first.1["data"]["outcome"] == "completed" {
        &first.1
    } else {
        &second.1
    };
    let access_code = completed["data"]["access_code"].as_str().unwrap();
    let (_, body) = send(&app, admin("GET", "/api/redemptions", None)).await;
    let codes = body["data"].as_array().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["code"], access_code);
    assert_eq!(codes[0]["source"], "auto_payment");
    assert_eq!(codes[0]["payment_order_id"], order_id.as_str());
    assert!(codes[0]["used_by_user_id"].is_i64());
}

#[tokio::test]
async fn test_redeem_code_links_devices_to_subscription() {
    let mut config = test_config();
    config.subscriptions.trial_days = 0;
    let app = spawn_app_with(config).await;

    let (status, body) = send(
        &app,
        admin(
            "POST",
            "/api/redemptions",
            Some(&json!({ "count": 2, "plan": "monthly", "duration_days": 30, "max_devices": 2 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let codes = body["data"].as_array().unwrap();
    assert_eq!(codes.len(), 2);
    let code = codes[0]["code"].as_str().unwrap().to_string();
    let code_id = codes[0]["id"].as_i64().unwrap();
    let other_code = codes[1]["code"].as_str().unwrap().to_string();

    let redeem = |code: &str, device_id: &str| {
        post_json(
            "/api/redemptions/redeem",
            &json!({ "code": code, "device_id": device_id }),
        )
    };

    let (status, body) = send(&app, redeem(&code.to_lowercase(), "phone")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["linked_existing"], false);
    assert_eq!(body["data"]["subscription"]["plan"], "monthly");
    assert_eq!(body["data"]["subscription"]["max_devices"], 2);
    let owner = body["data"]["user_id"].as_i64().unwrap();

    // Second device joins the same subscription.
    let (status, body) = send(&app, redeem(&code, "tablet")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["linked_existing"], true);
    assert_eq!(body["data"]["user_id"], owner);

    let (_, body) = send(
        &app,
        get("/api/access/premium?device_id=tablet&content_type=movie&slug=any"),
    )
    .await;
    assert_eq!(body["data"]["reason"], "subscription");

    let (status, _) = send(&app, redeem(&code, "laptop")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A device that already has its own subscription is not taken over.
    let (status, _) = send(&app, redeem(&other_code, "console")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, redeem(&code, "console")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = send(&app, admin("GET", "/api/redemptions/stats", None)).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["used"], 2);
    assert_eq!(body["data"]["available"], 0);
    assert_eq!(body["data"]["by_plan"]["monthly"], 2);

    let (status, body) = send(
        &app,
        admin("POST", &format!("/api/redemptions/{code_id}/revoke"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["subscriptions_revoked"], 1);

    let (_, body) = send(
        &app,
        get("/api/access/premium?device_id=phone&content_type=movie&slug=any"),
    )
    .await;
    assert_eq!(body["data"]["has_access"], false);

    let (status, _) = send(&app, redeem(&code, "phone")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, redeem("ZZZZZZZZ", "phone")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_redeem_rejects_lapsed_code() {
    let app = spawn_app_with(test_config()).await;

    let (_, body) = send(
        &app,
        admin(
            "POST",
            "/api/redemptions",
            Some(&json!({ "plan": "weekly", "expires_at": 1 })),
        ),
    )
    .await;
    let code = body["data"][0]["code"].as_str().unwrap().to_string();
    assert_eq!(body["data"][0]["duration_days"], 30);
    assert_eq!(body["data"][0]["max_devices"], 3);

    let (status, body) = send(
        &app,
        post_json(
            "/api/redemptions/redeem",
            &json!({ "code": code, "device_id": "late" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expired"));

    let (status, _) = send(
        &app,
        admin("POST", "/api/redemptions", Some(&json!({ "count": 0, "plan": "weekly" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
