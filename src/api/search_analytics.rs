use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::api::validation::{validate_days, validate_id, validate_limit};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::db::repositories::search::SearchEvent;
use crate::domain::SearchItemType;
use crate::services::AnalyticsError;
use crate::services::analytics::{
    ContentItem, QueryStat, SearchSummary, TrackRequest, TrendPoint, ZeroResultQuery,
};

impl From<AnalyticsError> for ApiError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Validation(msg) => Self::validation(msg),
            AnalyticsError::Database(msg) => Self::DatabaseError(msg),
            AnalyticsError::Internal(msg) => Self::internal(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportAction {
    #[default]
    Summary,
    TopQueries,
    ZeroResults,
    Recent,
    Trend,
    Content,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub action: ReportAction,
    pub days: Option<i64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Report {
    Summary(SearchSummary),
    TopQueries(Vec<QueryStat>),
    ZeroResults(Vec<ZeroResultQuery>),
    Recent(Vec<SearchEvent>),
    Trend(Vec<TrendPoint>),
    Content(Vec<ContentItem>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TrackAction {
    Track(TrackRequest),
    Click {
        search_id: i32,
        item: String,
        #[serde(rename = "type")]
        kind: SearchItemType,
    },
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TrackResult {
    Tracked { search_id: Option<i32> },
    Clicked { updated: bool },
}

/// `GET /api/search-analytics?action=summary|topQueries|zeroResults|recent|trend|content`
pub async fn report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ApiResponse<Report>>, ApiError> {
    let days = validate_days(query.days.unwrap_or(7))?;
    let limit = |default: u64| -> Result<u64, ApiError> {
        validate_limit(query.limit.unwrap_or(default), MAX_PAGE_SIZE)
    };
    let as_usize = |n: u64| usize::try_from(n).unwrap_or(usize::MAX);
    let analytics = state.analytics();

    let report = match query.action {
        ReportAction::Summary => Report::Summary(analytics.summary(days).await?),
        ReportAction::TopQueries => {
            Report::TopQueries(analytics.top_queries(days, as_usize(limit(20)?)).await?)
        }
        ReportAction::ZeroResults => Report::ZeroResults(
            analytics
                .zero_result_queries(days, as_usize(limit(30)?))
                .await?,
        ),
        ReportAction::Recent => Report::Recent(analytics.recent(limit(50)?).await?),
        ReportAction::Trend => Report::Trend(analytics.trend(days).await?),
        ReportAction::Content => Report::Content(
            analytics
                .most_searched_content(days, as_usize(limit(10)?))
                .await?,
        ),
    };

    Ok(Json(ApiResponse::success(report)))
}

/// `POST /api/search-analytics`
pub async fn track(
    State(state): State<Arc<AppState>>,
    Json(action): Json<TrackAction>,
) -> Result<Json<ApiResponse<TrackResult>>, ApiError> {
    let result = match action {
        TrackAction::Track(request) => TrackResult::Tracked {
            search_id: state.analytics().track(request).await?,
        },
        TrackAction::Click {
            search_id,
            item,
            kind,
        } => {
            let id = validate_id(search_id)?;
            TrackResult::Clicked {
                updated: state.analytics().track_click(id, &item, kind).await?,
            }
        }
    };
    Ok(Json(ApiResponse::success(result)))
}
