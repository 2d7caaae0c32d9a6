use axum::{
    Json,
    extract::{Query, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, IdQuery, WithId};
use crate::api::validation::{require_id, validate_slug};
use crate::db::repositories::channel::{Channel, ChannelFilter, ChannelPatch, NewChannel};

/// `GET /api/channels`
///
/// With `?slug=` the list holds at most one channel.
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ChannelFilter>,
) -> Result<Json<ApiResponse<Vec<Channel>>>, ApiError> {
    let channels = state.store().channels().list(&filter).await?;
    Ok(Json(ApiResponse::success(channels)))
}

pub async fn create_channel(
    State(state): State<Arc<AppState>>,
    Json(input): Json<NewChannel>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    validate_slug(&input.slug)?;
    if input.name.trim().is_empty() {
        return Err(ApiError::validation("Channel name cannot be empty"));
    }
    if state
        .store()
        .channels()
        .get_by_slug(&input.slug)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict(format!(
            "Channel slug '{}' already exists",
            input.slug
        )));
    }

    let channel = state.store().channels().create(input).await?;
    tracing::info!(channel_id = channel.id, slug = %channel.slug, "Channel created");
    Ok(Json(ApiResponse::success(channel)))
}

/// `PUT /api/channels` with the id in the body.
pub async fn update_channel(
    State(state): State<Arc<AppState>>,
    Json(input): Json<WithId<ChannelPatch>>,
) -> Result<Json<ApiResponse<Channel>>, ApiError> {
    let id = require_id(input.id)?;
    let channel = state
        .store()
        .channels()
        .update(id, input.patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Channel", id))?;
    Ok(Json(ApiResponse::success(channel)))
}

/// `DELETE /api/channels?id=`
pub async fn delete_channel(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IdQuery>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = require_id(query.id)?;
    if !state.store().channels().delete(id).await? {
        return Err(ApiError::not_found("Channel", id));
    }
    Ok(Json(ApiResponse::success(true)))
}
