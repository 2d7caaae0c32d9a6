use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, IdQuery, WithId};
use crate::api::validation::{require_id, validate_slug};
use crate::db::repositories::category::{Category, CategoryPatch, NewCategory};

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub inserted: usize,
}

pub async fn list_categories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<ApiResponse<Vec<Category>>>, ApiError> {
    let categories = state.store().categories().list(query.active_only).await?;
    Ok(Json(ApiResponse::success(categories)))
}

pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .store()
        .categories()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", &slug))?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewCategory>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    validate_slug(&input.slug)?;
    if state.store().categories().slug_exists(&input.slug).await? {
        return Err(ApiError::conflict(format!(
            "Category slug '{}' already exists",
            input.slug
        )));
    }
    let category = state.store().categories().create(input).await?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Json(input): Json<WithId<CategoryPatch>>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let id = require_id(input.id)?;

    if let Some(slug) = &input.patch.slug {
        validate_slug(slug)?;
        if let Some(existing) = state.store().categories().get_by_slug(slug).await?
            && existing.id != id
        {
            return Err(ApiError::conflict(format!(
                "Category slug '{slug}' already exists"
            )));
        }
    }

    let category = state
        .store()
        .categories()
        .update(id, input.patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Category", id))?;
    Ok(Json(ApiResponse::success(category)))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = require_id(query.id)?;
    if !state.store().categories().delete(id).await? {
        return Err(ApiError::not_found("Category", id));
    }
    Ok(Json(ApiResponse::success(true)))
}

/// `POST /api/categories/seed`
pub async fn seed_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SeedResponse>>, ApiError> {
    let inserted = state.store().categories().seed_defaults().await?;
    Ok(Json(ApiResponse::success(SeedResponse { inserted })))
}
