use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::validate_id;
use crate::db::repositories::ad::{AdSlot, AdSlotPatch, NewAdSlot, NewImpression};

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedStatus {
    Seeded,
    AlreadySeeded,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub status: SeedStatus,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ImpressionResponse {
    pub id: i32,
}

pub async fn list_ads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AdSlot>>>, ApiError> {
    let slots = state.store().ads().list().await?;
    Ok(Json(ApiResponse::success(slots)))
}

/// `GET /api/ads/page/{page}`: enabled slots configured for a page.
pub async fn ads_for_page(
    State(state): State<Arc<AppState>>,
    Path(page): Path<String>,
) -> Result<Json<ApiResponse<Vec<AdSlot>>>, ApiError> {
    let slots = state.store().ads().for_page(&page).await?;
    Ok(Json(ApiResponse::success(slots)))
}

pub async fn get_slot(
    State(state): State<Arc<AppState>>,
    Path(slot_key): Path<String>,
) -> Result<Json<ApiResponse<AdSlot>>, ApiError> {
    let slot = state
        .store()
        .ads()
        .get_by_slot(&slot_key)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad slot", &slot_key))?;
    Ok(Json(ApiResponse::success(slot)))
}

pub async fn create_ad(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewAdSlot>,
) -> Result<Json<ApiResponse<AdSlot>>, ApiError> {
    if input.slot_key.trim().is_empty() {
        return Err(ApiError::validation("slot_key cannot be empty"));
    }
    if state
        .store()
        .ads()
        .get_by_slot(&input.slot_key)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Ad slot '{}' already exists",
            input.slot_key
        )));
    }
    let slot = state.store().ads().create(input).await?;
    Ok(Json(ApiResponse::success(slot)))
}

pub async fn update_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<AdSlotPatch>,
) -> Result<Json<ApiResponse<AdSlot>>, ApiError> {
    let id = validate_id(id)?;
    let slot = state
        .store()
        .ads()
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad slot", id))?;
    Ok(Json(ApiResponse::success(slot)))
}

pub async fn delete_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    if !state.store().ads().delete(id).await? {
        return Err(ApiError::not_found("Ad slot", id));
    }
    Ok(Json(ApiResponse::success(true)))
}

pub async fn toggle_ad(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ToggleResponse>>, ApiError> {
    let id = validate_id(id)?;
    let enabled = state
        .store()
        .ads()
        .toggle(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ad slot", id))?;
    Ok(Json(ApiResponse::success(ToggleResponse { enabled })))
}

pub async fn seed_ads(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SeedResponse>>, ApiError> {
    let status = if state.store().ads().seed().await? {
        SeedStatus::Seeded
    } else {
        SeedStatus::AlreadySeeded
    };
    Ok(Json(ApiResponse::success(SeedResponse { status })))
}

/// `POST /api/ads/impression`
pub async fn track_impression(
    State(state): State<Arc<AppState>>,
    Json(impression): Json<NewImpression>,
) -> Result<Json<ApiResponse<ImpressionResponse>>, ApiError> {
    if impression.ad_slot.trim().is_empty() {
        return Err(ApiError::validation("ad_slot cannot be empty"));
    }
    let ad_type = impression.ad_type;
    let id = state.store().ads().record_impression(impression).await?;
    metrics::counter!("ad_impressions_total", "type" => ad_type.as_str()).increment(1);
    Ok(Json(ApiResponse::success(ImpressionResponse { id })))
}
