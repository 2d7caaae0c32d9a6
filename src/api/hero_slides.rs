use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::api::validation::validate_id;
use crate::db::repositories::hero_slide::{HeroSlide, HeroSlidePatch, NewHeroSlide};
use crate::domain::SlideContentType;

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<i32>,
}

/// `GET /api/hero-slides`
///
/// Active slides, with movie and series slides filled in from the movie.
pub async fn active_slides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<HeroSlide>>>, ApiError> {
    let slides = state.catalog().active_slides().await?;
    Ok(Json(ApiResponse::success(slides)))
}

/// `GET /api/hero-slides/all`
pub async fn all_slides(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<HeroSlide>>>, ApiError> {
    let slides = state.store().hero_slides().list(false).await?;
    Ok(Json(ApiResponse::success(slides)))
}

pub async fn create_slide(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewHeroSlide>,
) -> Result<Json<ApiResponse<HeroSlide>>, ApiError> {
    if input.content_type != SlideContentType::Custom
        && input.content_id.as_deref().is_none_or(|s| s.trim().is_empty())
    {
        return Err(ApiError::validation(
            "Movie and series slides need a content_id",
        ));
    }
    let slide = state.store().hero_slides().create(input).await?;
    Ok(Json(ApiResponse::success(slide)))
}

pub async fn update_slide(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(patch): Json<HeroSlidePatch>,
) -> Result<Json<ApiResponse<HeroSlide>>, ApiError> {
    let id = validate_id(id)?;
    let slide = state
        .store()
        .hero_slides()
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Hero slide", id))?;
    Ok(Json(ApiResponse::success(slide)))
}

pub async fn delete_slide(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    if !state.store().hero_slides().delete(id).await? {
        return Err(ApiError::not_found("Hero slide", id));
    }
    Ok(Json(ApiResponse::success(true)))
}

/// `POST /api/hero-slides/reorder`: `order` becomes the position in `ids`, from 1.
pub async fn reorder_slides(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if request.ids.is_empty() {
        return Err(ApiError::validation("ids cannot be empty"));
    }
    state.store().hero_slides().reorder(&request.ids).await?;
    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Slides reordered",
    ))))
}
