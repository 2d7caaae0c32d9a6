use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::db::repositories::payment::Payment;
use crate::services::PaymentError;
use crate::services::payment_service::{CreatePayment, WebhookOutcome, WebhookPayload};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotFound => Self::NotFound("Payment not found".to_string()),
            PaymentError::Unauthorized => Self::Unauthorized(err.to_string()),
            PaymentError::Validation(msg) => Self::validation(msg),
            PaymentError::Database(msg) => Self::DatabaseError(msg),
            PaymentError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// `POST /api/pay`
///
/// Logs a pending order. The client is sent to the gateway with the returned
/// `order_id`; the gateway reports back through the webhook.
pub async fn create_payment(
    State(state): State<Arc<AppState>>,
    Json(input): Json<CreatePayment>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    let payment = state.payments().create_pending(input).await?;
    Ok(Json(ApiResponse::success(payment)))
}

/// `POST /api/pay/webhook`
pub async fn webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<ApiResponse<WebhookOutcome>>, ApiError> {
    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());
    state.payments().verify_webhook_secret(provided).await?;

    let outcome = state.payments().handle_webhook(payload).await?;
    Ok(Json(ApiResponse::success(outcome)))
}
