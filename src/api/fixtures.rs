use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::{validate_id, validate_limit};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::repositories::fixture::{AllowedLeague, Fixture, SyncLog};
use crate::domain::{DayMode, MatchStatus};
use crate::services::FixtureError;
use crate::services::fixtures::{ImportResult, SyncOutcome};

impl From<FixtureError> for ApiError {
    fn from(err: FixtureError) -> Self {
        match err {
            FixtureError::NotFound(what) => Self::NotFound(format!("{what} not found")),
            FixtureError::Conflict(msg) => Self::Conflict(msg),
            FixtureError::Validation(msg) => Self::validation(msg),
            FixtureError::Database(msg) => Self::DatabaseError(msg),
            FixtureError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    Yesterday,
    #[default]
    Today,
    Tomorrow,
    All,
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    #[serde(default)]
    pub mode: SyncMode,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureView {
    #[default]
    Day,
    Live,
    Upcoming,
    Finished,
    All,
}

#[derive(Debug, Deserialize)]
pub struct FixtureQuery {
    #[serde(default)]
    pub view: FixtureView,
    pub mode: Option<DayMode>,
    pub status: Option<MatchStatus>,
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub fixture_ids: Vec<i32>,
}

/// One entry per requested fixture. A failed import does not undo the others.
#[derive(Debug, Serialize)]
pub struct ImportEntry {
    pub fixture_id: i32,
    #[serde(flatten)]
    pub result: Option<ImportResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddLeagueRequest {
    pub league_name: String,
    pub api_league_id: i32,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub inserted: usize,
}

/// `POST /api/fixtures/sync?mode=yesterday|today|tomorrow|all`
pub async fn sync(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyncQuery>,
) -> Result<Json<ApiResponse<Vec<SyncOutcome>>>, ApiError> {
    let mode = match query.mode {
        SyncMode::All => {
            let outcomes = state.fixtures().sync_all_days().await?;
            return Ok(Json(ApiResponse::success(outcomes)));
        }
        SyncMode::Yesterday => DayMode::Yesterday,
        SyncMode::Today => DayMode::Today,
        SyncMode::Tomorrow => DayMode::Tomorrow,
    };

    let outcome = state.fixtures().sync(mode).await?;
    if !outcome.ok {
        return Err(ApiError::football_api_error(
            outcome.error.unwrap_or_else(|| "sync failed".to_string()),
        ));
    }
    Ok(Json(ApiResponse::success(vec![outcome])))
}

/// `GET /api/fixtures?view=day|live|upcoming|finished|all`
pub async fn list_fixtures(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FixtureQuery>,
) -> Result<Json<ApiResponse<Vec<Fixture>>>, ApiError> {
    let fixtures = state.fixtures();
    let list = match query.view {
        FixtureView::Day => {
            fixtures
                .by_day(query.mode.unwrap_or(DayMode::Today), query.status)
                .await?
        }
        FixtureView::Live => fixtures.live().await?,
        FixtureView::Upcoming => fixtures.upcoming_today().await?,
        FixtureView::Finished => fixtures.finished_today().await?,
        FixtureView::All => {
            let limit = query
                .limit
                .map(|l| validate_limit(l, MAX_PAGE_SIZE * 5))
                .transpose()?;
            fixtures.all(query.status, limit).await?
        }
    };
    Ok(Json(ApiResponse::success(list)))
}

pub async fn get_fixture(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<Fixture>>, ApiError> {
    let fixture = state.fixtures().by_slug(&slug).await?;
    Ok(Json(ApiResponse::success(fixture)))
}

pub async fn sync_logs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<ApiResponse<Vec<SyncLog>>>, ApiError> {
    let limit = validate_limit(query.limit.unwrap_or(20), MAX_PAGE_SIZE)?;
    let logs = state.fixtures().sync_logs(limit).await?;
    Ok(Json(ApiResponse::success(logs)))
}

/// `POST /api/fixtures/import`
pub async fn import(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ImportRequest>,
) -> Result<Json<ApiResponse<Vec<ImportEntry>>>, ApiError> {
    if request.fixture_ids.is_empty() {
        return Err(ApiError::validation("fixture_ids cannot be empty"));
    }

    let mut entries = Vec::with_capacity(request.fixture_ids.len());
    for fixture_id in request.fixture_ids {
        let entry = match state.fixtures().import_to_match(fixture_id).await {
            Ok(result) => ImportEntry {
                fixture_id,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                tracing::warn!(fixture_id, error = %e, "Fixture import failed");
                ImportEntry {
                    fixture_id,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        entries.push(entry);
    }
    Ok(Json(ApiResponse::success(entries)))
}

pub async fn list_leagues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AllowedLeague>>>, ApiError> {
    let leagues = state.fixtures().leagues().await?;
    Ok(Json(ApiResponse::success(leagues)))
}

pub async fn add_league(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddLeagueRequest>,
) -> Result<Json<ApiResponse<AllowedLeague>>, ApiError> {
    let league = state
        .fixtures()
        .add_league(&request.league_name, request.api_league_id)
        .await?;
    Ok(Json(ApiResponse::success(league)))
}

pub async fn toggle_league(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ToggleResponse>>, ApiError> {
    let id = validate_id(id)?;
    let enabled = state.fixtures().toggle_league(id).await?;
    Ok(Json(ApiResponse::success(ToggleResponse { enabled })))
}

pub async fn seed_leagues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<SeedResponse>>, ApiError> {
    let inserted = state.fixtures().seed_leagues().await?;
    Ok(Json(ApiResponse::success(SeedResponse { inserted })))
}
