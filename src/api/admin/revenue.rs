use axum::{Json, extract::State};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState};
use crate::services::revenue::{self, RevenueReport};

/// `GET /api/admin/revenue`
pub async fn get_revenue(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<RevenueReport>>, ApiError> {
    let report = revenue::report(state.store()).await?;
    Ok(Json(ApiResponse::success(report)))
}
