use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::auth::AdminUser;
use crate::api::validation::{validate_id, validate_limit};
use crate::constants::limits::{MAX_PAGE_SIZE, NOTIFICATION_HISTORY};
use crate::db::repositories::notification::{NotificationLog, PreferencesPatch};
use crate::domain::ReleaseKind;
use crate::services::notifications::{BroadcastRequest, PreferencesView, ReminderToggle};
use crate::services::push::DeliveryReport;

#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePreferencesRequest {
    pub device_id: String,
    #[serde(flatten)]
    pub patch: PreferencesPatch,
}

#[derive(Debug, Deserialize)]
pub struct ToggleReminderRequest {
    pub match_id: i32,
    pub user_id: Option<i32>,
    pub device_id: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleReminderResponse {
    pub status: ReminderToggle,
}

#[derive(Debug, Deserialize)]
pub struct ReminderStatusQuery {
    pub match_id: i32,
    pub user_id: Option<i32>,
    pub device_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReminderStatusResponse {
    pub has_reminder: bool,
}

#[derive(Debug, Deserialize)]
pub struct NewReleaseRequest {
    pub kind: ReleaseKind,
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u64>,
}

pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeviceQuery>,
) -> Result<Json<ApiResponse<PreferencesView>>, ApiError> {
    let prefs = state.notifications().preferences(&query.device_id).await?;
    Ok(Json(ApiResponse::success(prefs)))
}

pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> Result<Json<ApiResponse<PreferencesView>>, ApiError> {
    let prefs = state
        .notifications()
        .update_preferences(&request.device_id, request.patch)
        .await?;
    Ok(Json(ApiResponse::success(prefs)))
}

/// `POST /api/notifications/reminders`: adds the reminder, or removes it when present.
pub async fn toggle_reminder(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleReminderRequest>,
) -> Result<Json<ApiResponse<ToggleReminderResponse>>, ApiError> {
    let match_id = validate_id(request.match_id)?;
    if request.device_id.trim().is_empty() {
        return Err(ApiError::validation("device_id is required"));
    }
    let status = state
        .notifications()
        .toggle_reminder(match_id, request.user_id, &request.device_id)
        .await?;
    Ok(Json(ApiResponse::success(ToggleReminderResponse { status })))
}

pub async fn reminder_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReminderStatusQuery>,
) -> Result<Json<ApiResponse<ReminderStatusResponse>>, ApiError> {
    let has_reminder = state
        .notifications()
        .reminder_status(query.match_id, query.user_id, query.device_id.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(ReminderStatusResponse {
        has_reminder,
    })))
}

/// `POST /api/notifications/broadcast`
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    Extension(AdminUser(admin)): Extension<AdminUser>,
    Json(mut request): Json<BroadcastRequest>,
) -> Result<Json<ApiResponse<DeliveryReport>>, ApiError> {
    request.sent_by.get_or_insert(admin);
    let report = state.notifications().broadcast(request).await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn notify_new_release(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NewReleaseRequest>,
) -> Result<Json<ApiResponse<DeliveryReport>>, ApiError> {
    if request.title.trim().is_empty() || request.slug.trim().is_empty() {
        return Err(ApiError::validation("title and slug are required"));
    }
    let report = state
        .notifications()
        .notify_new_release(request.kind, &request.title, &request.slug)
        .await?;
    Ok(Json(ApiResponse::success(report)))
}

pub async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<NotificationLog>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(NOTIFICATION_HISTORY), MAX_PAGE_SIZE)?;
    let logs = state.notifications().history(limit).await?;
    Ok(Json(ApiResponse::success(logs)))
}
