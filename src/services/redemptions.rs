//! Redemption codes: admin-issued or payment-issued codes that open a
//! subscription, and later let the buyer attach more devices to it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::constants::redemptions::{
    DEFAULT_DURATION_DAYS, DEFAULT_MAX_DEVICES, MAX_CODES_PER_BATCH,
};
use crate::db::Store;
use crate::db::repositories::redemption::{NewRedemption, Redemption, RedemptionStats};
use crate::db::repositories::subscription::Subscription;
use crate::domain::events::NotificationEvent;
use crate::domain::{Plan, RedemptionSource, now_millis};
use crate::services::access_service::{AccessError, AccessService, CreateSubscription};

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Code has already been used")]
    AlreadyUsed,

    #[error("Code has expired")]
    Expired,

    #[error("Code has been revoked")]
    Revoked,

    #[error("Device is registered to another subscriber")]
    DeviceOwnedByAnotherUser,

    #[error("Device limit reached ({current}/{max})")]
    DeviceLimitReached { current: u64, max: i32 },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for RedemptionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RedemptionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AccessError> for RedemptionError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotFound(what) => Self::NotFound(what),
            AccessError::DeviceOwnedByAnotherUser => Self::DeviceOwnedByAnotherUser,
            AccessError::DeviceLimitReached { current, max } => {
                Self::DeviceLimitReached { current, max }
            }
            AccessError::Validation(msg) => Self::Validation(msg),
            AccessError::Database(msg) => Self::Database(msg),
            AccessError::Internal(msg) => Self::Internal(msg),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateCodes {
    #[serde(default = "default_count")]
    pub count: u32,
    pub plan: Plan,
    #[serde(default)]
    pub duration_days: Option<i32>,
    #[serde(default)]
    pub max_devices: Option<i32>,
    #[serde(default)]
    pub note: Option<String>,
    /// Redeem-by date; codes without one never lapse.
    #[serde(default)]
    pub expires_at: Option<i64>,
}

const fn default_count() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize)]
pub struct RedeemOutcome {
    pub user_id: i32,
    pub device_id: String,
    pub subscription: Subscription,
    /// `true` when the device joined a subscription opened earlier with the code.
    pub linked_existing: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeOutcome {
    pub redemption: Redemption,
    pub subscriptions_revoked: usize,
}

pub struct RedemptionService {
    store: Store,
    access: Arc<dyn AccessService>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl RedemptionService {
    #[must_use]
    pub fn new(
        store: Store,
        access: Arc<dyn AccessService>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            access,
            event_bus,
        }
    }

    pub async fn list(&self, limit: u64) -> Result<Vec<Redemption>, RedemptionError> {
        Ok(self.store.redemptions().list(limit).await?)
    }

    pub async fn stats(&self) -> Result<RedemptionStats, RedemptionError> {
        Ok(self.store.redemptions().stats(now_millis()).await?)
    }

    pub async fn generate(&self, input: GenerateCodes) -> Result<Vec<Redemption>, RedemptionError> {
        if input.count == 0 || input.count > MAX_CODES_PER_BATCH {
            return Err(RedemptionError::Validation(format!(
                "count must be between 1 and {MAX_CODES_PER_BATCH}"
            )));
        }
        let duration_days = input.duration_days.unwrap_or(DEFAULT_DURATION_DAYS);
        let max_devices = input.max_devices.unwrap_or(DEFAULT_MAX_DEVICES);
        if duration_days <= 0 || max_devices <= 0 {
            return Err(RedemptionError::Validation(
                "duration_days and max_devices must be positive".to_string(),
            ));
        }

        let repo = self.store.redemptions();
        let mut created = Vec::with_capacity(input.count as usize);
        for _ in 0..input.count {
            created.push(
                repo.create(NewRedemption {
                    plan: input.plan,
                    duration_days,
                    max_devices,
                    source: RedemptionSource::Manual,
                    payment_order_id: None,
                    note: input.note.clone(),
                    expires_at: input.expires_at,
                    used_by_user_id: None,
                })
                .await?,
            );
        }
        info!(count = created.len(), plan = %input.plan, duration_days, "Redemption codes generated");
        Ok(created)
    }

    /// Redeems `code` on `device_id`.
    ///
    /// A fresh code opens a subscription for the device's viewer. A code that
    /// already opened a still-active subscription attaches the device to that
    /// subscription's viewer, within its device cap.
    pub async fn redeem(
        &self,
        code: &str,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<RedeemOutcome, RedemptionError> {
        let code = code.trim().to_uppercase();
        let device_id = device_id.trim();
        if code.is_empty() || device_id.is_empty() {
            return Err(RedemptionError::Validation(
                "code and device_id are required".to_string(),
            ));
        }

        let redemption = self
            .store
            .redemptions()
            .find_by_code(&code)
            .await?
            .ok_or_else(|| RedemptionError::NotFound("Code".to_string()))?;
        if redemption.revoked_at.is_some() {
            return Err(RedemptionError::Revoked);
        }

        let now = now_millis();
        if redemption.used_by_user_id.is_some() {
            return self.link_device(&redemption, device_id, user_agent, now).await;
        }
        if redemption.expires_at.is_some_and(|at| at <= now) {
            return Err(RedemptionError::Expired);
        }

        let identity = self.access.get_or_create_user(device_id, user_agent).await?;
        let user_id = identity.user.id;
        let redemptions = self.store.redemptions();
        if !redemptions.mark_used(redemption.id, user_id).await? {
            return Err(RedemptionError::AlreadyUsed);
        }

        let plan: Plan = redemption
            .plan
            .parse()
            .map_err(|e: crate::domain::UnknownVariant| RedemptionError::Internal(e.to_string()))?;
        let created = self
            .access
            .create_subscription(CreateSubscription {
                user_id,
                plan,
                days: Some(i64::from(redemption.duration_days)),
                max_devices: Some(redemption.max_devices),
                match_id: None,
                access_code: Some(code.clone()),
            })
            .await;
        let subscription = match created {
            Ok(subscription) => subscription,
            Err(err) => {
                warn!(code = %code, error = %err, "Activation failed, releasing code");
                redemptions.release(redemption.id).await?;
                return Err(err.into());
            }
        };

        info!(code = %code, user_id, subscription_id = subscription.id, "Code redeemed");
        let _ = self.event_bus.send(NotificationEvent::CodeRedeemed {
            code,
            user_id,
            plan: plan.as_str().to_string(),
        });

        Ok(RedeemOutcome {
            user_id,
            device_id: device_id.to_string(),
            subscription,
            linked_existing: false,
        })
    }

    async fn link_device(
        &self,
        redemption: &Redemption,
        device_id: &str,
        user_agent: Option<&str>,
        now: i64,
    ) -> Result<RedeemOutcome, RedemptionError> {
        let subscription = self
            .store
            .subscriptions()
            .active_by_access_code(&redemption.code, now)
            .await?
            .ok_or(RedemptionError::AlreadyUsed)?;
        let owner = subscription.user_id;

        let viewers = self.store.viewers();
        let existing = viewers.find_device(device_id).await?;
        if let Some(device) = &existing
            && device.user_id == owner
        {
            let device = viewers.touch_device(device.clone(), user_agent).await?;
            return Ok(RedeemOutcome {
                user_id: owner,
                device_id: device.device_id,
                subscription,
                linked_existing: true,
            });
        }

        if let Some(device) = &existing
            && self.access.active_subscription(device.user_id).await?.is_some()
        {
            return Err(RedemptionError::DeviceOwnedByAnotherUser);
        }

        let current = viewers.count_devices(owner).await?;
        if current >= u64::try_from(subscription.max_devices).unwrap_or(0) {
            return Err(RedemptionError::DeviceLimitReached {
                current,
                max: subscription.max_devices,
            });
        }

        match existing {
            Some(device) => {
                info!(device_id, from = device.user_id, to = owner, "Device moved to subscriber");
                viewers.reassign_device(device, owner).await?;
            }
            None => {
                viewers.insert_device(owner, device_id, user_agent).await?;
            }
        }

        Ok(RedeemOutcome {
            user_id: owner,
            device_id: device_id.to_string(),
            subscription,
            linked_existing: true,
        })
    }

    /// Revokes the code and every active subscription it opened.
    pub async fn revoke(&self, id: i32) -> Result<RevokeOutcome, RedemptionError> {
        let redemption = self
            .store
            .redemptions()
            .revoke(id)
            .await?
            .ok_or_else(|| RedemptionError::NotFound(format!("Redemption {id}")))?;

        let revoked = self
            .store
            .subscriptions()
            .revoke_by_access_code(&redemption.code)
            .await?;
        for subscription_id in &revoked {
            let _ = self.event_bus.send(NotificationEvent::SubscriptionRevoked {
                id: *subscription_id,
            });
        }
        info!(code = %redemption.code, subscriptions = revoked.len(), "Code revoked");

        Ok(RevokeOutcome {
            redemption,
            subscriptions_revoked: revoked.len(),
        })
    }

    pub async fn delete(&self, id: i32) -> Result<(), RedemptionError> {
        if !self.store.redemptions().delete(id).await? {
            return Err(RedemptionError::NotFound(format!("Redemption {id}")));
        }
        Ok(())
    }
}
