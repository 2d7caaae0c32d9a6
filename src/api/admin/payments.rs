use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{ApiError, ApiResponse, AppState};
use crate::domain::PaymentStatus;
use crate::domain::pagination::PageRequest;
use crate::services::payment_service::PaymentList;

#[derive(Debug, Deserialize)]
pub struct PaymentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
}

impl PaymentsQuery {
    /// `all` and an empty value both mean no status filter.
    fn status(&self) -> Result<Option<PaymentStatus>, ApiError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("" | "all") => Ok(None),
            Some(s) => Ok(Some(s.parse()?)),
        }
    }
}

/// `GET /api/admin/payments`
pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PaymentsQuery>,
) -> Result<Json<ApiResponse<PaymentList>>, ApiError> {
    let status = query.status()?;
    let request = PageRequest::new(query.page, query.limit);
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let list = state
        .payments()
        .list_payments(request, status, search)
        .await?;
    Ok(Json(ApiResponse::success(list)))
}
