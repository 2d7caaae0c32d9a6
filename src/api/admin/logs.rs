use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState, DeletedCount};
use crate::db::SystemLog;
use crate::db::repositories::logs::LogFilter;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub level: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

const fn default_page() -> u64 {
    1
}

const fn default_page_size() -> u64 {
    50
}

#[derive(Debug, Serialize)]
pub struct LogResponse {
    pub logs: Vec<SystemLog>,
    pub total_pages: u64,
}

/// `GET /api/admin/logs`, newest first.
pub async fn get_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<ApiResponse<LogResponse>>, ApiError> {
    let page_size = query.page_size.clamp(1, 200);
    let filter = LogFilter {
        level: query.level,
        event_type: query.event_type,
        start_date: query.start_date,
        end_date: query.end_date,
    };

    let (logs, total_pages) = state
        .store()
        .logs()
        .page(query.page.max(1), page_size, &filter)
        .await?;

    Ok(Json(ApiResponse::success(LogResponse { logs, total_pages })))
}

pub async fn clear_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<DeletedCount>>, ApiError> {
    let deleted_count = state.store().logs().clear().await?;
    Ok(Json(ApiResponse::success(DeletedCount { deleted_count })))
}
