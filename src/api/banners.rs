use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, IdQuery, WithId};
use crate::api::validation::require_id;
use crate::db::repositories::banner::{BannerPatch, NewBanner, PromoBanner};
use crate::domain::now_millis;

#[derive(Debug, Deserialize)]
pub struct BannerListQuery {
    #[serde(rename = "type")]
    pub banner_type: Option<String>,
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list_banners(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BannerListQuery>,
) -> Result<Json<ApiResponse<Vec<PromoBanner>>>, ApiError> {
    let active_at = query.active_only.then(now_millis);
    let banners = state
        .store()
        .banners()
        .list(query.banner_type.as_deref(), active_at)
        .await?;
    Ok(Json(ApiResponse::success(banners)))
}

pub async fn create_banner(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewBanner>,
) -> Result<Json<ApiResponse<PromoBanner>>, ApiError> {
    if input.name.trim().is_empty() || input.headline.trim().is_empty() {
        return Err(ApiError::validation("Banner name and headline are required"));
    }
    if let (Some(start), Some(end)) = (input.start_date, input.end_date)
        && end < start
    {
        return Err(ApiError::validation("Banner end date is before its start date"));
    }
    let banner = state.store().banners().create(input).await?;
    Ok(Json(ApiResponse::success(banner)))
}

pub async fn update_banner(
    State(state): State<Arc<AppState>>,
    Json(input): Json<WithId<BannerPatch>>,
) -> Result<Json<ApiResponse<PromoBanner>>, ApiError> {
    let id = require_id(input.id)?;
    let banner = state
        .store()
        .banners()
        .update(id, input.patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Banner", id))?;
    Ok(Json(ApiResponse::success(banner)))
}

pub async fn delete_banner(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = require_id(query.id)?;
    if !state.store().banners().delete(id).await? {
        return Err(ApiError::not_found("Banner", id));
    }
    Ok(Json(ApiResponse::success(true)))
}
