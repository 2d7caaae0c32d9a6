use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::{validate_id, validate_limit, validate_search_query};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::repositories::matches::{Match, MatchFilter, MatchPatch, NewMatch};
use crate::domain::MatchStatus;
use crate::services::catalog::GroupedMatches;

#[derive(Debug, Deserialize)]
pub struct MatchListQuery {
    pub status: Option<MatchStatus>,
    pub league: Option<String>,
    pub premium: Option<bool>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub ids: Vec<i32>,
    pub status: MatchStatus,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub updated: u64,
}

pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchListQuery>,
) -> Result<Json<ApiResponse<Vec<Match>>>, ApiError> {
    let filter = MatchFilter {
        status: query.status,
        league: query.league.filter(|l| !l.trim().is_empty()),
        premium: query.premium,
        limit: query
            .limit
            .map(|l| validate_limit(l, MAX_PAGE_SIZE))
            .transpose()?,
    };
    let matches = state.store().matches().list(&filter).await?;
    Ok(Json(ApiResponse::success(matches)))
}

/// `GET /api/matches/grouped`
pub async fn grouped_matches(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<GroupedMatches>>, ApiError> {
    let grouped = state.catalog().grouped_matches().await?;
    Ok(Json(ApiResponse::success(grouped)))
}

pub async fn get_match(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Match>>, ApiError> {
    let found = state
        .store()
        .matches()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Match", &slug))?;
    Ok(Json(ApiResponse::success(found)))
}

pub async fn get_match_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Match>>, ApiError> {
    let id = validate_id(id)?;
    let found = state
        .store()
        .matches()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Match", id))?;
    Ok(Json(ApiResponse::success(found)))
}

/// `GET /api/matches/id/{id}/related`
pub async fn related_matches(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<Match>>>, ApiError> {
    let id = validate_id(id)?;
    let related = state.store().matches().related(id).await?;
    Ok(Json(ApiResponse::success(related)))
}

/// `GET /api/matches/search?q=`
pub async fn search_matches(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<Match>>>, ApiError> {
    let q = validate_search_query(&query.q)?;
    let results = state.store().matches().search(q).await?;
    Ok(Json(ApiResponse::success(results)))
}

/// `POST /api/matches/view/{slug}`
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    if !state.store().matches().increment_views(&slug).await? {
        return Err(ApiError::not_found("Match", &slug));
    }
    Ok(Json(ApiResponse::success(true)))
}

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewMatch>,
) -> Result<Json<ApiResponse<Match>>, ApiError> {
    let created = state.catalog().create_match(input).await?;
    Ok(Json(ApiResponse::success(created)))
}

pub async fn update_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<MatchPatch>,
) -> Result<Json<ApiResponse<Match>>, ApiError> {
    let id = validate_id(id)?;
    let updated = state.catalog().update_match(id, patch).await?;
    Ok(Json(ApiResponse::success(updated)))
}

pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.catalog().delete_match(id).await?;
    Ok(Json(ApiResponse::success(true)))
}

/// `POST /api/matches/bulk-status`
pub async fn bulk_update_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BulkStatusRequest>,
) -> Result<Json<ApiResponse<BulkStatusResponse>>, ApiError> {
    let updated = state
        .catalog()
        .bulk_update_status(request.ids, request.status)
        .await?;
    Ok(Json(ApiResponse::success(BulkStatusResponse { updated })))
}
