use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, header},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::validate_id;
use crate::db::repositories::user::Device;
use crate::domain::ContentType;
use crate::services::access_service::{IdentifyResult, SubscriptionDetails};
use crate::services::{AccessError, ContentRef, PremiumAccess};

impl From<AccessError> for ApiError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            AccessError::DeviceOwnedByAnotherUser => Self::Conflict(err.to_string()),
            AccessError::DeviceLimitReached { .. } => Self::Forbidden(err.to_string()),
            AccessError::Validation(msg) => Self::validation(msg),
            AccessError::Database(msg) => Self::DatabaseError(msg),
            AccessError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdentifyRequest {
    pub device_id: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterDeviceRequest {
    pub user_id: i32,
    pub device_id: String,
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PremiumQuery {
    pub device_id: Option<String>,
    pub content_type: Option<ContentType>,
    pub slug: Option<String>,
    pub match_id: Option<i32>,
}

impl PremiumQuery {
    fn content(&self) -> Result<ContentRef, ApiError> {
        match self.content_type {
            Some(ContentType::Movie) => {
                let slug = self
                    .slug
                    .clone()
                    .ok_or_else(|| ApiError::validation("slug is required for movies"))?;
                Ok(ContentRef::Movie { slug })
            }
            Some(ContentType::Match) => {
                let id = self
                    .match_id
                    .ok_or_else(|| ApiError::validation("match_id is required for matches"))?;
                Ok(ContentRef::Match { id })
            }
            None => Ok(ContentRef::Any),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: String,
}

fn user_agent(headers: &HeaderMap, explicit: Option<String>) -> Option<String> {
    explicit.or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    })
}

/// `POST /api/users/identify`
///
/// First contact from a device creates the viewer with a trial.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<IdentifyRequest>,
) -> Result<Json<ApiResponse<IdentifyResult>>, ApiError> {
    let ua = user_agent(&headers, request.user_agent);
    let result = state
        .access()
        .get_or_create_user(&request.device_id, ua.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// `POST /api/devices`
pub async fn register_device(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<Json<ApiResponse<Device>>, ApiError> {
    let user_id = validate_id(request.user_id)?;
    let ua = user_agent(&headers, request.user_agent);
    let device = state
        .access()
        .register_device(user_id, &request.device_id, ua.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(device)))
}

/// `GET /api/access/premium`
pub async fn check_premium(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PremiumQuery>,
) -> Result<Json<ApiResponse<PremiumAccess>>, ApiError> {
    let content = query.content()?;
    let access = state
        .access()
        .check_premium_access(query.device_id.as_deref(), content)
        .await?;
    Ok(Json(ApiResponse::success(access)))
}

/// `GET /api/subscriptions/me?device_id=`
pub async fn my_subscription(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<ApiResponse<SubscriptionDetails>>, ApiError> {
    let details = state
        .access()
        .subscription_details(&query.device_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Device", &query.device_id))?;
    Ok(Json(ApiResponse::success(details)))
}
