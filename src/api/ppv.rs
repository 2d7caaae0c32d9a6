use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::validate_id;
use crate::db::repositories::ppv::{PpvConfig, PpvConfigInput, PpvStats};
use crate::domain::ContentType;
use crate::services::PpvError;
use crate::services::ppv_service::{AccessCheck, AdWatchResult, PaidPurchase};

impl From<PpvError> for ApiError {
    fn from(err: PpvError) -> Self {
        match err {
            PpvError::NotFound => Self::NotFound("PPV content not found".to_string()),
            PpvError::AdSupportDisabled => Self::Forbidden(err.to_string()),
            PpvError::Validation(msg) => Self::validation(msg),
            PpvError::Database(msg) => Self::DatabaseError(msg),
            PpvError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub content_type: ContentType,
    pub content_id: String,
    pub user_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigListQuery {
    pub content_type: Option<ContentType>,
}

/// Body for the ad-watch and purchase endpoints.
#[derive(Debug, Deserialize)]
pub struct ContentAction {
    pub user_id: i32,
    #[serde(default)]
    pub device_id: Option<String>,
    pub content_type: ContentType,
    pub content_id: String,
}

/// `GET /api/ppv/access?content_type=&content_id=&user_id=`
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<AccessCheck>>, ApiError> {
    let check = state
        .ppv()
        .check_access(query.content_type, &query.content_id, query.user_id)
        .await?;
    Ok(Json(ApiResponse::success(check)))
}

/// `GET /api/ppv/config?content_type=&content_id=`
pub async fn get_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ContentQuery>,
) -> Result<Json<ApiResponse<Option<PpvConfig>>>, ApiError> {
    let config = state
        .ppv()
        .get_config(query.content_type, &query.content_id)
        .await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn list_configs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfigListQuery>,
) -> Result<Json<ApiResponse<Vec<PpvConfig>>>, ApiError> {
    let configs = state.ppv().list_configs(query.content_type).await?;
    Ok(Json(ApiResponse::success(configs)))
}

pub async fn upsert_config(
    State(state): State<Arc<AppState>>,
    Json(input): Json<PpvConfigInput>,
) -> Result<Json<ApiResponse<PpvConfig>>, ApiError> {
    let config = state.ppv().upsert_config(input).await?;
    Ok(Json(ApiResponse::success(config)))
}

pub async fn delete_config(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.ppv().delete_config(id).await?;
    Ok(Json(ApiResponse::success(true)))
}

pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<PpvStats>>, ApiError> {
    let stats = state.ppv().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// `POST /api/ppv/ad-watch`
pub async fn record_ad_watch(
    State(state): State<Arc<AppState>>,
    Json(action): Json<ContentAction>,
) -> Result<Json<ApiResponse<AdWatchResult>>, ApiError> {
    let user_id = validate_id(action.user_id)?;
    let result = state
        .ppv()
        .record_ad_watch(
            user_id,
            action.device_id.as_deref(),
            action.content_type,
            &action.content_id,
        )
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

/// `POST /api/ppv/purchase`
pub async fn purchase(
    State(state): State<Arc<AppState>>,
    Json(action): Json<ContentAction>,
) -> Result<Json<ApiResponse<PaidPurchase>>, ApiError> {
    let user_id = validate_id(action.user_id)?;
    let purchase = state
        .ppv()
        .create_paid_purchase(user_id, action.content_type, &action.content_id)
        .await?;
    Ok(Json(ApiResponse::success(purchase)))
}
