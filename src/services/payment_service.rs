//! Payment log: pending orders, gateway webhooks and the admin debug view.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repositories::payment::{Payment, PaymentStats};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{PaymentStatus, Plan};
use crate::services::access_service::AccessError;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment not found")]
    NotFound,

    #[error("Invalid webhook secret")]
    Unauthorized,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PaymentError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PaymentError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccessError> for PaymentError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Validation(msg) => Self::Validation(msg),
            AccessError::Database(msg) => Self::Database(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub device_id: String,
    pub plan: Plan,
    #[serde(default)]
    pub gateway: Option<String>,
}

/// Gateway callback body. Gateways disagree on casing of the order id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, alias = "orderId")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub sid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "paymentType")]
    pub payment_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WebhookOutcome {
    Completed {
        order_id: String,
        subscription_id: i32,
        access_code: Option<String>,
    },
    Failed {
        order_id: String,
    },
    AlreadyProcessed,
    Recorded {
        order_id: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentRow {
    #[serde(flatten)]
    pub payment: Payment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentList {
    #[serde(flatten)]
    pub page: Page<PaymentRow>,
    pub stats: PaymentStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
    Success,
    Failed,
    Other,
}

impl GatewayStatus {
    #[must_use]
    pub fn classify(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "success" | "successful" | "completed" | "complete" | "paid" | "approved" => {
                Self::Success
            }
            "failed" | "declined" | "cancelled" | "canceled" => Self::Failed,
            _ => Self::Other,
        }
    }
}

#[async_trait::async_trait]
pub trait PaymentService: Send + Sync {
    async fn create_pending(&self, input: CreatePayment) -> Result<Payment, PaymentError>;

    /// # Errors
    ///
    /// [`PaymentError::Unauthorized`] when a secret is configured and `provided` does not match.
    async fn verify_webhook_secret(&self, provided: Option<&str>) -> Result<(), PaymentError>;

    async fn handle_webhook(&self, payload: WebhookPayload) -> Result<WebhookOutcome, PaymentError>;

    async fn list_payments(
        &self,
        request: PageRequest,
        status: Option<PaymentStatus>,
        search: Option<&str>,
    ) -> Result<PaymentList, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status_classification() {
        for s in ["success", "Completed", "PAID", " approved "] {
            assert_eq!(GatewayStatus::classify(s), GatewayStatus::Success, "{s}");
        }
        for s in ["failed", "declined", "cancelled", "canceled"] {
            assert_eq!(GatewayStatus::classify(s), GatewayStatus::Failed, "{s}");
        }
        assert_eq!(GatewayStatus::classify("processing"), GatewayStatus::Other);
        assert_eq!(GatewayStatus::classify(""), GatewayStatus::Other);
    }

    #[test]
    fn test_webhook_payload_accepts_camel_case_order_id() {
        let payload: WebhookPayload =
            serde_json::from_str(r#"{"orderId":"FB-1","status":"paid"}"#).unwrap();
        assert_eq!(payload.order_id.as_deref(), Some("FB-1"));
        assert_eq!(payload.status.as_deref(), Some("paid"));
    }
}
