use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::api::validation::{validate_id, validate_limit};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::repositories::series::{
    Episode, EpisodePatch, NewEpisode, NewSeries, Series, SeriesPatch,
};
use crate::services::catalog::SeriesDetail;

#[derive(Debug, Deserialize)]
pub struct SeriesListQuery {
    pub published: Option<bool>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct EpisodeQuery {
    /// Include unpublished episodes (admin editors).
    #[serde(default)]
    pub all: bool,
}

/// `GET /api/series`
pub async fn list_series(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SeriesListQuery>,
) -> Result<Json<ApiResponse<Vec<Series>>>, ApiError> {
    let limit = query
        .limit
        .map(|l| validate_limit(l, MAX_PAGE_SIZE))
        .transpose()?;
    let series = state.store().series().list(query.published, limit).await?;
    Ok(Json(ApiResponse::success(series)))
}

/// `GET /api/series/{slug}`
pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<SeriesDetail>>, ApiError> {
    let detail = state.catalog().series_detail(&slug).await?;
    Ok(Json(ApiResponse::success(detail)))
}

/// `POST /api/series/{slug}/view`
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !state.store().series().increment_views(&slug).await? {
        return Err(ApiError::not_found("Series", &slug));
    }
    Ok(Json(ApiResponse::success(MessageResponse::new("View recorded"))))
}

/// `GET /api/series/id/{id}/episodes`
pub async fn list_episodes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Query(query): Query<EpisodeQuery>,
) -> Result<Json<ApiResponse<Vec<Episode>>>, ApiError> {
    let id = validate_id(id)?;
    let repo = state.store().series();
    if repo.get(id).await?.is_none() {
        return Err(ApiError::not_found("Series", id));
    }
    let episodes = repo.episodes(id, !query.all).await?;
    Ok(Json(ApiResponse::success(episodes)))
}

/// `POST /api/series`
pub async fn create_series(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewSeries>,
) -> Result<Json<ApiResponse<Series>>, ApiError> {
    let series = state.catalog().create_series(input).await?;
    Ok(Json(ApiResponse::success(series)))
}

/// `PUT /api/series/id/{id}`
pub async fn update_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<SeriesPatch>,
) -> Result<Json<ApiResponse<Series>>, ApiError> {
    let id = validate_id(id)?;
    let series = state.catalog().update_series(id, patch).await?;
    Ok(Json(ApiResponse::success(series)))
}

/// `DELETE /api/series/id/{id}`
pub async fn delete_series(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.catalog().delete_series(id).await?;
    Ok(Json(ApiResponse::success(true)))
}

/// `POST /api/series/id/{id}/episodes`
pub async fn create_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(input): Json<NewEpisode>,
) -> Result<Json<ApiResponse<Episode>>, ApiError> {
    let id = validate_id(id)?;
    let episode = state.catalog().create_episode(id, input).await?;
    Ok(Json(ApiResponse::success(episode)))
}

/// `PUT /api/episodes/{id}`
pub async fn update_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<EpisodePatch>,
) -> Result<Json<ApiResponse<Episode>>, ApiError> {
    let id = validate_id(id)?;
    let episode = state.catalog().update_episode(id, patch).await?;
    Ok(Json(ApiResponse::success(episode)))
}

/// `DELETE /api/episodes/{id}`
pub async fn delete_episode(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.catalog().delete_episode(id).await?;
    Ok(Json(ApiResponse::success(true)))
}
