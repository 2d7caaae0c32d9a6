use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::validation::validate_id;
use crate::api::{ApiError, ApiResponse, AppState, DeletedCount};
use crate::services::access_service::DeviceOverview;

#[derive(Debug, Deserialize)]
pub struct DevicesQuery {
    pub user_id: Option<i32>,
    pub subscription_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ClearDevicesQuery {
    pub all: Option<String>,
    pub device_id: Option<String>,
    pub user_id: Option<i32>,
}

/// `GET /api/admin/devices?user_id=|subscription_id=`
pub async fn list_devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DevicesQuery>,
) -> Result<Json<ApiResponse<DeviceOverview>>, ApiError> {
    let user_id = match (query.user_id, query.subscription_id) {
        (Some(user_id), _) => validate_id(user_id)?,
        (None, Some(subscription_id)) => {
            let subscription = state
                .access()
                .get_subscription(validate_id(subscription_id)?)
                .await?;
            subscription.user_id
        }
        (None, None) => {
            return Err(ApiError::validation("user_id or subscription_id is required"));
        }
    };

    let overview = state.access().devices_for_user(user_id).await?;
    Ok(Json(ApiResponse::success(overview)))
}

/// `DELETE /api/admin/devices?all=1|device_id=|user_id=`
pub async fn clear_devices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClearDevicesQuery>,
) -> Result<Json<ApiResponse<DeletedCount>>, ApiError> {
    let deleted_count = if matches!(query.all.as_deref(), Some("1" | "true")) {
        state.access().clear_all_devices().await?
    } else if let Some(device_id) = query.device_id.as_deref().filter(|d| !d.trim().is_empty()) {
        state.access().remove_device(device_id).await?
    } else if let Some(user_id) = query.user_id {
        state.access().clear_user_devices(validate_id(user_id)?).await?
    } else {
        return Err(ApiError::validation("all, device_id or user_id is required"));
    };

    tracing::info!(deleted_count, "Devices cleared by admin");
    Ok(Json(ApiResponse::success(DeletedCount { deleted_count })))
}
