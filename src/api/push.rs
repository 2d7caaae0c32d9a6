use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState};
use crate::api::auth::resolve_admin;
use crate::db::repositories::push::SavePushSubscription;
use crate::services::PushError;
use crate::services::push::DeliveryReport;

impl From<PushError> for ApiError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            PushError::Validation(msg) => Self::validation(msg),
            PushError::Database(msg) => Self::DatabaseError(msg),
            PushError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// Browser `PushSubscription.toJSON()` shape.
#[derive(Debug, Deserialize)]
pub struct BrowserSubscription {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PushAction {
    Subscribe {
        subscription: BrowserSubscription,
        #[serde(default)]
        device_id: Option<String>,
        #[serde(default)]
        user_id: Option<i32>,
    },
    Send {
        title: String,
        body: String,
        #[serde(default)]
        url: Option<String>,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PushActionResult {
    Subscribed { subscription_id: i32 },
    Sent(DeliveryReport),
}

#[derive(Debug, Deserialize)]
pub struct EndpointQuery {
    pub endpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeResponse {
    pub removed: bool,
}

/// `POST /api/push`
///
/// `subscribe` is open to any visitor; `send` needs an admin.
pub async fn push_action(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    session: Session,
    Json(action): Json<PushAction>,
) -> Result<Json<ApiResponse<PushActionResult>>, ApiError> {
    match action {
        PushAction::Subscribe {
            subscription,
            device_id,
            user_id,
        } => {
            let user_agent = headers
                .get(axum::http::header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let saved = state
                .push()
                .save_subscription(SavePushSubscription {
                    endpoint: subscription.endpoint,
                    p256dh: subscription.keys.p256dh,
                    auth: subscription.keys.auth,
                    user_id,
                    device_id,
                    user_agent,
                })
                .await?;
            Ok(Json(ApiResponse::success(PushActionResult::Subscribed {
                subscription_id: saved.id,
            })))
        }
        PushAction::Send { title, body, url } => {
            if resolve_admin(&state, &headers, &session).await.is_none() {
                return Err(ApiError::Unauthorized("Unauthorized".to_string()));
            }
            if title.trim().is_empty() || body.trim().is_empty() {
                return Err(ApiError::validation("title and body are required"));
            }
            let payload = state.push().payload(&title, &body, url.as_deref()).await;
            let report = state.push().broadcast_all(&payload).await?;
            Ok(Json(ApiResponse::success(PushActionResult::Sent(report))))
        }
    }
}

/// `DELETE /api/push?endpoint=`
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EndpointQuery>,
) -> Result<Json<ApiResponse<UnsubscribeResponse>>, ApiError> {
    let endpoint = query
        .endpoint
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| ApiError::validation("endpoint is required"))?;
    let removed = state.push().unsubscribe(&endpoint).await?;
    Ok(Json(ApiResponse::success(UnsubscribeResponse { removed })))
}
