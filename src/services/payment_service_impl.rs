use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::payment::{NewPayment, Payment, SuccessOutcome};
use crate::db::repositories::redemption::NewRedemption;
use crate::domain::events::NotificationEvent;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{PaymentStatus, Plan, RedemptionSource, now_millis};
use crate::services::access_service::{AccessService, CreateSubscription};
use crate::services::payment_service::{
    CreatePayment, GatewayStatus, PaymentError, PaymentList, PaymentRow, PaymentService,
    WebhookOutcome, WebhookPayload,
};

const DEFAULT_GATEWAY: &str = "sifalo";
const AWAITING_CALLBACK: &str = "Awaiting payment callback/verify";

pub struct SeaOrmPaymentService {
    store: Store,
    config: Arc<RwLock<Config>>,
    access: Arc<dyn AccessService>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmPaymentService {
    #[must_use]
    pub fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        access: Arc<dyn AccessService>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            config,
            access,
            event_bus,
        }
    }

    /// Claims the payment before any side effect, so duplicate or concurrent
    /// callbacks create at most one subscription.
    async fn complete(
        &self,
        payment: Payment,
        payload: WebhookPayload,
    ) -> Result<WebhookOutcome, PaymentError> {
        let payments = self.store.payments();
        if !payments.claim_success(payment.id).await? {
            info!(order_id = %payment.order_id, "Payment already claimed by another callback");
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let id = payment.id;
        let previous_status = payment.status.clone();
        let result = self.fulfil(payment, payload).await;
        if result.is_err() {
            payments.release_claim(id, &previous_status).await?;
        }
        result
    }

    async fn fulfil(
        &self,
        payment: Payment,
        payload: WebhookPayload,
    ) -> Result<WebhookOutcome, PaymentError> {
        let plan: Plan = payment
            .plan
            .parse()
            .map_err(|e: crate::domain::UnknownVariant| PaymentError::Internal(e.to_string()))?;

        let identity = self
            .access
            .get_or_create_user(&payment.device_id, None)
            .await?;
        let max_devices = self.store.settings().get().await?.max_devices_for(plan);
        let redemption = self
            .store
            .redemptions()
            .create(NewRedemption {
                plan,
                duration_days: i32::try_from(plan.default_days()).unwrap_or(i32::MAX),
                max_devices,
                source: RedemptionSource::AutoPayment,
                payment_order_id: Some(payment.order_id.clone()),
                note: None,
                expires_at: None,
                used_by_user_id: Some(identity.user.id),
            })
            .await?;
        let access_code = redemption.code;

        let subscription = self
            .access
            .create_subscription(CreateSubscription {
                user_id: identity.user.id,
                plan,
                days: None,
                max_devices: Some(max_devices),
                match_id: None,
                access_code: Some(access_code.clone()),
            })
            .await?;

        let order_id = payment.order_id.clone();
        let amount = payment.amount;
        self.store
            .payments()
            .mark_success(
                payment,
                SuccessOutcome {
                    user_id: identity.user.id,
                    subscription_id: subscription.id,
                    access_code: Some(access_code.clone()),
                    sid: payload.sid,
                    payment_type: Some(
                        payload.payment_type.unwrap_or_else(|| "unknown".to_string()),
                    ),
                    message: payload.message,
                },
            )
            .await?;

        info!(
            order_id = %order_id,
            user_id = identity.user.id,
            subscription_id = subscription.id,
            "Payment verified, subscription created"
        );
        let _ = self.event_bus.send(NotificationEvent::PaymentCompleted {
            order_id: order_id.clone(),
            plan: plan.as_str().to_string(),
            amount,
        });

        Ok(WebhookOutcome::Completed {
            order_id,
            subscription_id: subscription.id,
            access_code: Some(access_code),
        })
    }
}

/// `FB-` followed by twelve uppercase hex characters.
#[must_use]
pub fn generate_order_id() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("FB-{}", &id[..12])
}

fn debug_reason(payment: &Payment) -> Option<String> {
    payment
        .failure_reason
        .clone()
        .or_else(|| payment.last_gateway_message.clone())
        .or_else(|| {
            (payment.status == PaymentStatus::Pending.as_str())
                .then(|| AWAITING_CALLBACK.to_string())
        })
}

#[async_trait]
impl PaymentService for SeaOrmPaymentService {
    async fn create_pending(&self, input: CreatePayment) -> Result<Payment, PaymentError> {
        let device_id = input.device_id.trim();
        if device_id.is_empty() {
            return Err(PaymentError::Validation("device_id is required".to_string()));
        }

        let settings = self.store.settings().get().await?;
        let currency = self.config.read().await.payments.default_currency.clone();
        let gateway = input
            .gateway
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .unwrap_or_else(|| DEFAULT_GATEWAY.to_string());

        let payment = self
            .store
            .payments()
            .create_pending(NewPayment {
                order_id: generate_order_id(),
                device_id: device_id.to_string(),
                plan: input.plan,
                amount: settings.price_for(input.plan),
                currency,
                gateway,
            })
            .await?;

        info!(
            order_id = %payment.order_id,
            plan = %payment.plan,
            amount = payment.amount,
            "Pending payment created"
        );
        Ok(payment)
    }

    async fn verify_webhook_secret(&self, provided: Option<&str>) -> Result<(), PaymentError> {
        let expected = self.config.read().await.payments.webhook_secret.clone();
        match expected {
            None => Ok(()),
            Some(secret) if provided == Some(secret.as_str()) => Ok(()),
            Some(_) => {
                warn!("Rejected payment webhook with a bad secret");
                Err(PaymentError::Unauthorized)
            }
        }
    }

    async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> Result<WebhookOutcome, PaymentError> {
        let order_id = payload.order_id.as_deref().filter(|s| !s.is_empty());
        let sid = payload.sid.as_deref().filter(|s| !s.is_empty());
        if order_id.is_none() && sid.is_none() {
            return Err(PaymentError::Validation(
                "Missing sid or order_id".to_string(),
            ));
        }

        let payments = self.store.payments();
        let mut payment = None;
        if let Some(order_id) = order_id {
            payment = payments.get_by_order_id(order_id).await?;
        }
        if payment.is_none()
            && let Some(sid) = sid
        {
            payment = payments.get_by_sid(sid).await?;
        }
        let Some(payment) = payment else {
            warn!(?order_id, ?sid, "Webhook for unknown payment");
            return Err(PaymentError::NotFound);
        };

        if payment.status == PaymentStatus::Success.as_str() {
            return Ok(WebhookOutcome::AlreadyProcessed);
        }

        let status = payload.status.as_deref().unwrap_or_default();
        match GatewayStatus::classify(status) {
            GatewayStatus::Success => self.complete(payment, payload).await,
            GatewayStatus::Failed => {
                let order_id = payment.order_id.clone();
                let reason = payload
                    .message
                    .clone()
                    .or_else(|| Some(format!("Gateway status: {status}")));
                if !payments
                    .mark_failed(&payment, reason.clone(), payload.sid)
                    .await?
                {
                    return Ok(WebhookOutcome::AlreadyProcessed);
                }
                warn!(order_id = %order_id, ?reason, "Payment failed");
                let _ = self.event_bus.send(NotificationEvent::PaymentFailed {
                    order_id: order_id.clone(),
                    reason,
                });
                Ok(WebhookOutcome::Failed { order_id })
            }
            GatewayStatus::Other => {
                let order_id = payment.order_id.clone();
                let message = payload
                    .message
                    .or_else(|| (!status.is_empty()).then(|| format!("Gateway status: {status}")));
                payments
                    .record_gateway_message(payment, message, payload.sid)
                    .await?;
                Ok(WebhookOutcome::Recorded { order_id })
            }
        }
    }

    async fn list_payments(
        &self,
        request: PageRequest,
        status: Option<PaymentStatus>,
        search: Option<&str>,
    ) -> Result<PaymentList, PaymentError> {
        let payments = self.store.payments();
        let (items, total) = payments.list_page(request, status, search).await?;

        let stale_minutes = self.config.read().await.payments.stale_pending_minutes;
        let stale_before = now_millis() - stale_minutes * crate::constants::time::MILLIS_PER_MINUTE;
        let stats = payments.stats(stale_before).await?;

        let rows = items
            .into_iter()
            .map(|payment| PaymentRow {
                debug_reason: debug_reason(&payment),
                payment,
            })
            .collect();

        Ok(PaymentList {
            page: Page::new(rows, total, request),
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_shape() {
        let id = generate_order_id();
        assert!(id.starts_with("FB-"));
        assert_eq!(id.len(), 15);
        assert!(id[3..].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_lowercase()));
        assert_ne!(generate_order_id(), id);
    }
}
