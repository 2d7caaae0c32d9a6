use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::api::validation::{validate_id, validate_limit};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::repositories::movie::{Movie, MovieFilter, MoviePatch, NewMovie};
use crate::services::CatalogError;

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            CatalogError::Conflict(msg) => Self::Conflict(msg),
            CatalogError::Validation(msg) => Self::validation(msg),
            CatalogError::Database(msg) => Self::DatabaseError(msg),
            CatalogError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieListQuery {
    pub published: Option<bool>,
    pub premium: Option<bool>,
    pub dubbed: Option<bool>,
    pub genre: Option<String>,
    pub limit: Option<u64>,
}

/// `GET /api/movies`
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MovieListQuery>,
) -> Result<Json<ApiResponse<Vec<Movie>>>, ApiError> {
    let limit = query
        .limit
        .map(|l| validate_limit(l, MAX_PAGE_SIZE))
        .transpose()?;

    let movies = match query.genre.as_deref().map(str::trim).filter(|g| !g.is_empty()) {
        Some(genre) => {
            state
                .store()
                .movies()
                .list_by_genre(genre, limit.unwrap_or(MAX_PAGE_SIZE))
                .await?
        }
        None => {
            let filter = MovieFilter {
                published: query.published,
                premium: query.premium,
                dubbed: query.dubbed,
                limit,
            };
            state.store().movies().list(&filter).await?
        }
    };

    Ok(Json(ApiResponse::success(movies)))
}

/// `GET /api/movies/{slug}`
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    let movie = state
        .store()
        .movies()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie", &slug))?;
    Ok(Json(ApiResponse::success(movie)))
}

/// `GET /api/movies/id/{id}`
pub async fn get_movie_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    let id = validate_id(id)?;
    let movie = state
        .store()
        .movies()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Movie", id))?;
    Ok(Json(ApiResponse::success(movie)))
}

/// `POST /api/movies/{slug}/view`
pub async fn record_view(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !state.store().movies().increment_views(&slug).await? {
        return Err(ApiError::not_found("Movie", &slug));
    }
    Ok(Json(ApiResponse::success(MessageResponse::new("View recorded"))))
}

/// `POST /api/movies`
pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewMovie>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    let movie = state.catalog().create_movie(input).await?;
    Ok(Json(ApiResponse::success(movie)))
}

/// `PUT /api/movies/id/{id}`
pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<MoviePatch>,
) -> Result<Json<ApiResponse<Movie>>, ApiError> {
    let id = validate_id(id)?;
    let movie = state.catalog().update_movie(id, patch).await?;
    Ok(Json(ApiResponse::success(movie)))
}

/// `DELETE /api/movies/id/{id}`
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.catalog().delete_movie(id).await?;
    Ok(Json(ApiResponse::success(true)))
}
