use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, header},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::{validate_id, validate_limit};
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::db::repositories::redemption::{Redemption, RedemptionStats};
use crate::services::RedemptionError;
use crate::services::redemptions::{GenerateCodes, RedeemOutcome, RevokeOutcome};

impl From<RedemptionError> for ApiError {
    fn from(err: RedemptionError) -> Self {
        match err {
            RedemptionError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            RedemptionError::AlreadyUsed
            | RedemptionError::Expired
            | RedemptionError::Revoked => Self::validation(err.to_string()),
            RedemptionError::DeviceOwnedByAnotherUser => Self::Conflict(err.to_string()),
            RedemptionError::DeviceLimitReached { .. } => Self::Forbidden(err.to_string()),
            RedemptionError::Validation(msg) => Self::validation(msg),
            RedemptionError::Database(msg) => Self::DatabaseError(msg),
            RedemptionError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
    pub device_id: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<u64>,
}

/// `POST /api/redemptions/redeem`
pub async fn redeem(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<ApiResponse<RedeemOutcome>>, ApiError> {
    let user_agent = request.user_agent.or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });
    let outcome = state
        .redemptions()
        .redeem(&request.code, &request.device_id, user_agent.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `GET /api/redemptions`
pub async fn list_codes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<Redemption>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE), MAX_PAGE_SIZE)?;
    let codes = state.redemptions().list(limit).await?;
    Ok(Json(ApiResponse::success(codes)))
}

/// `POST /api/redemptions`
pub async fn generate_codes(
    State(state): State<Arc<AppState>>,
    Json(input): Json<GenerateCodes>,
) -> Result<Json<ApiResponse<Vec<Redemption>>>, ApiError> {
    let codes = state.redemptions().generate(input).await?;
    Ok(Json(ApiResponse::success(codes)))
}

/// `GET /api/redemptions/stats`
pub async fn stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RedemptionStats>>, ApiError> {
    let stats = state.redemptions().stats().await?;
    Ok(Json(ApiResponse::success(stats)))
}

/// `POST /api/redemptions/{id}/revoke`
pub async fn revoke_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RevokeOutcome>>, ApiError> {
    let id = validate_id(id)?;
    let outcome = state.redemptions().revoke(id).await?;
    Ok(Json(ApiResponse::success(outcome)))
}

/// `DELETE /api/redemptions/{id}`
pub async fn delete_code(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    let id = validate_id(id)?;
    state.redemptions().delete(id).await?;
    Ok(Json(ApiResponse::success(true)))
}
