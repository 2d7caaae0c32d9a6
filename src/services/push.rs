//! Browser push delivery.
//!
//! Sends go through a [`PushSender`] so the HTTP transport can be swapped for
//! a relay or a test double. A batch always runs to completion: one bad
//! endpoint never stops the rest, and endpoints the push service reports as
//! gone are deactivated.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::db::Store;
use crate::db::repositories::push::{PushSubscription, SavePushSubscription};

#[derive(Debug, Error)]
pub enum PushError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PushError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PushError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Delivered,
    /// The endpoint no longer exists (HTTP 404/410).
    Gone,
    Failed(String),
}

#[async_trait]
pub trait PushSender: Send + Sync {
    async fn send(&self, subscription: &PushSubscription, payload: &PushPayload) -> SendOutcome;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub sent: usize,
    pub failed: usize,
    pub total: usize,
    pub deactivated: usize,
}

impl DeliveryReport {
    fn merge(&mut self, other: Self) {
        self.sent += other.sent;
        self.failed += other.failed;
        self.total += other.total;
        self.deactivated += other.deactivated;
    }
}

pub struct PushService {
    store: Store,
    config: Arc<RwLock<Config>>,
    sender: Arc<dyn PushSender>,
}

impl PushService {
    #[must_use]
    pub fn new(store: Store, config: Arc<RwLock<Config>>, sender: Arc<dyn PushSender>) -> Self {
        Self {
            store,
            config,
            sender,
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.config.read().await.push.enabled
    }

    /// Payload with the configured icon.
    pub async fn payload(&self, title: &str, body: &str, url: Option<&str>) -> PushPayload {
        PushPayload {
            title: title.to_string(),
            body: body.to_string(),
            url: url.map(str::to_string),
            icon: self.config.read().await.push.icon.clone(),
        }
    }

    pub async fn save_subscription(
        &self,
        input: SavePushSubscription,
    ) -> Result<PushSubscription, PushError> {
        if input.endpoint.trim().is_empty() {
            return Err(PushError::Validation("endpoint is required".to_string()));
        }
        if input.p256dh.is_empty() || input.auth.is_empty() {
            return Err(PushError::Validation(
                "subscription keys are required".to_string(),
            ));
        }
        Ok(self.store.push().save(input).await?)
    }

    pub async fn unsubscribe(&self, endpoint: &str) -> Result<bool, PushError> {
        Ok(self.store.push().delete_by_endpoint(endpoint).await?)
    }

    pub async fn mark_inactive(&self, id: i32) -> Result<bool, PushError> {
        Ok(self.store.push().mark_inactive(id).await?)
    }

    pub async fn user_subscriptions(&self, user_id: i32) -> Result<Vec<PushSubscription>, PushError> {
        Ok(self.store.push().for_user(user_id).await?)
    }

    pub async fn all_active(&self) -> Result<Vec<PushSubscription>, PushError> {
        Ok(self.store.push().all_active().await?)
    }

    pub async fn send_to_user(
        &self,
        user_id: i32,
        payload: &PushPayload,
    ) -> Result<DeliveryReport, PushError> {
        let subscriptions = self.user_subscriptions(user_id).await?;
        self.send_batch(subscriptions, payload).await
    }

    pub async fn broadcast_all(&self, payload: &PushPayload) -> Result<DeliveryReport, PushError> {
        let subscriptions = self.all_active().await?;
        self.send_batch(subscriptions, payload).await
    }

    /// Deliver `payload` to every subscription, `push.batch_size` at a time.
    pub async fn send_batch(
        &self,
        subscriptions: Vec<PushSubscription>,
        payload: &PushPayload,
    ) -> Result<DeliveryReport, PushError> {
        let (enabled, batch_size) = {
            let config = self.config.read().await;
            (config.push.enabled, config.push.batch_size.max(1))
        };
        if !enabled {
            debug!(count = subscriptions.len(), "Push disabled, skipping batch");
            return Ok(DeliveryReport::default());
        }

        let mut report = DeliveryReport::default();
        for chunk in subscriptions.chunks(batch_size) {
            let outcomes = join_all(chunk.iter().map(|s| self.sender.send(s, payload))).await;
            report.merge(self.settle(chunk, outcomes).await?);
        }

        metrics::counter!("push_sent_total")
            .increment(u64::try_from(report.sent).unwrap_or(u64::MAX));
        metrics::counter!("push_failed_total")
            .increment(u64::try_from(report.failed).unwrap_or(u64::MAX));
        Ok(report)
    }

    async fn settle(
        &self,
        chunk: &[PushSubscription],
        outcomes: Vec<SendOutcome>,
    ) -> Result<DeliveryReport, PushError> {
        let repo = self.store.push();
        let mut report = DeliveryReport {
            total: chunk.len(),
            ..DeliveryReport::default()
        };

        for (subscription, outcome) in chunk.iter().zip(outcomes) {
            match outcome {
                SendOutcome::Delivered => {
                    report.sent += 1;
                    repo.record_delivery(subscription.id).await?;
                }
                SendOutcome::Gone => {
                    report.failed += 1;
                    if repo.mark_inactive(subscription.id).await? {
                        report.deactivated += 1;
                    }
                    debug!(subscription_id = subscription.id, "Push endpoint gone, deactivated");
                }
                SendOutcome::Failed(reason) => {
                    report.failed += 1;
                    repo.record_failure(subscription.id).await?;
                    warn!(
                        subscription_id = subscription.id,
                        error = %reason,
                        "Push delivery failed"
                    );
                }
            }
        }
        Ok(report)
    }
}
