use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, SystemStatus};
use crate::domain::JobName;
use crate::services::scheduler::JobReport;

/// `GET /api/system/status`
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    let database = state.store().ping().await.is_ok();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database,
        scheduler_running: state.scheduler.is_running().await,
    })))
}

/// `POST /api/system/jobs/{name}`
///
/// Runs a scheduled job now. A run already in progress makes this a skip.
pub async fn run_job(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ApiResponse<JobReport>>, ApiError> {
    let job: JobName = name.parse()?;
    tracing::info!(event = "job_triggered", job_name = %job, "Job triggered via API");
    let report = state.scheduler.run_job(job).await?;
    Ok(Json(ApiResponse::success(report)))
}
