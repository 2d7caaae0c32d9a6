use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::validation::require_id;
use crate::api::{ApiError, ApiResponse, AppState};
use crate::db::repositories::subscription::Subscription;
use crate::domain::SubscriptionStatus;
use crate::domain::pagination::{Page, PageRequest};
use crate::services::access_service::{CreateSubscription, SubscriberRow};

#[derive(Debug, Deserialize)]
pub struct SubscribersQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSubscriberRequest {
    pub id: Option<i32>,
    pub status: SubscriptionStatus,
}

/// `GET /api/admin/subscribers`
pub async fn list_subscribers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubscribersQuery>,
) -> Result<Json<ApiResponse<Page<SubscriberRow>>>, ApiError> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(s) => Some(s.parse::<SubscriptionStatus>()?),
    };
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let page = state
        .access()
        .list_subscribers(PageRequest::new(query.page, query.limit), status, search)
        .await?;
    Ok(Json(ApiResponse::success(page)))
}

/// `PUT /api/admin/subscribers` with `{id, status}`.
pub async fn update_subscriber(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UpdateSubscriberRequest>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let id = require_id(request.id)?;
    let subscription = match request.status {
        SubscriptionStatus::Revoked => state.access().revoke(id).await?,
        status => state.access().update_status(id, status).await?,
    };
    Ok(Json(ApiResponse::success(subscription)))
}

/// `POST /api/admin/subscribers`: grant a plan by hand.
pub async fn create_subscriber(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreateSubscription>,
) -> Result<Json<ApiResponse<Subscription>>, ApiError> {
    let subscription = state.access().create_subscription(input).await?;
    Ok(Json(ApiResponse::success(subscription)))
}
