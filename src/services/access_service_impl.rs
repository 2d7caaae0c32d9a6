use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

use crate::config::Config;
use crate::constants::time::MILLIS_PER_DAY;
use crate::db::Store;
use crate::db::repositories::subscription::{NewSubscription, Subscription};
use crate::db::repositories::user::Device;
use crate::domain::events::NotificationEvent;
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{Plan, SubscriptionStatus, now_millis};
use crate::services::access_service::{
    AccessError, AccessReason, AccessService, ContentRef, CreateSubscription, DeviceLimit,
    DeviceOverview, IdentifyResult, PremiumAccess, SubscriberRow, SubscriptionDetails,
};

/// Device cap for viewers without an active subscription.
const UNSUBSCRIBED_MAX_DEVICES: i32 = 1;

pub struct SeaOrmAccessService {
    store: Store,
    config: Arc<RwLock<Config>>,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmAccessService {
    #[must_use]
    pub const fn new(
        store: Store,
        config: Arc<RwLock<Config>>,
        event_bus: broadcast::Sender<NotificationEvent>,
    ) -> Self {
        Self {
            store,
            config,
            event_bus,
        }
    }

    async fn require_user(&self, user_id: i32) -> Result<(), AccessError> {
        if self.store.viewers().get(user_id).await?.is_none() {
            return Err(AccessError::NotFound(format!("User {user_id}")));
        }
        Ok(())
    }

    fn emit_cleared(&self, scope: String, deleted: u64) {
        let _ = self
            .event_bus
            .send(NotificationEvent::DevicesCleared { scope, deleted });
    }
}

#[async_trait]
impl AccessService for SeaOrmAccessService {
    async fn get_or_create_user(
        &self,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<IdentifyResult, AccessError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(AccessError::Validation("device_id is required".to_string()));
        }

        let viewers = self.store.viewers();
        if let Some(device) = viewers.find_device(device_id).await? {
            if let Some(user) = viewers.get(device.user_id).await? {
                viewers.touch(user.id).await?;
                let device = viewers.touch_device(device, user_agent).await?;
                return Ok(IdentifyResult {
                    user,
                    device,
                    is_new: false,
                });
            }
            // Device row outlived its viewer; start over.
            warn!(device_id, user_id = device.user_id, "Dropping orphaned device");
            viewers.delete_device(device_id).await?;
        }

        let trial_days = self.config.read().await.subscriptions.trial_days;
        let trial_expires_at = (trial_days > 0).then(|| now_millis() + trial_days * MILLIS_PER_DAY);

        let (user, device) = viewers
            .create_with_device(device_id, user_agent, trial_expires_at)
            .await?;
        info!(user_id = user.id, device_id, trial_days, "New viewer created");

        Ok(IdentifyResult {
            user,
            device,
            is_new: true,
        })
    }

    async fn register_device(
        &self,
        user_id: i32,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<Device, AccessError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(AccessError::Validation("device_id is required".to_string()));
        }
        self.require_user(user_id).await?;

        let viewers = self.store.viewers();
        if let Some(existing) = viewers.find_device(device_id).await? {
            if existing.user_id != user_id {
                return Err(AccessError::DeviceOwnedByAnotherUser);
            }
            return Ok(viewers.touch_device(existing, user_agent).await?);
        }

        let limit = self.check_device_limit(user_id).await?;
        if limit.current_count >= u64::try_from(limit.max_allowed).unwrap_or(0) {
            return Err(AccessError::DeviceLimitReached {
                current: limit.current_count,
                max: limit.max_allowed,
            });
        }

        Ok(viewers.insert_device(user_id, device_id, user_agent).await?)
    }

    async fn check_device_limit(&self, user_id: i32) -> Result<DeviceLimit, AccessError> {
        let current = self.store.viewers().count_devices(user_id).await?;
        let max = self
            .active_subscription(user_id)
            .await?
            .map_or(UNSUBSCRIBED_MAX_DEVICES, |s| s.max_devices);
        Ok(DeviceLimit::new(current, max))
    }

    async fn remove_device(&self, device_id: &str) -> Result<u64, AccessError> {
        let deleted = self.store.viewers().delete_device(device_id).await?;
        if deleted > 0 {
            self.emit_cleared(format!("device {device_id}"), deleted);
        }
        Ok(deleted)
    }

    async fn devices_for_user(&self, user_id: i32) -> Result<DeviceOverview, AccessError> {
        let user = self
            .store
            .viewers()
            .get(user_id)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("User {user_id}")))?;
        let devices = self.store.viewers().devices_for_user(user_id).await?;
        let limit = self.check_device_limit(user_id).await?;

        Ok(DeviceOverview {
            user,
            devices,
            limit,
        })
    }

    async fn clear_user_devices(&self, user_id: i32) -> Result<u64, AccessError> {
        let deleted = self.store.viewers().delete_devices_for_user(user_id).await?;
        info!(user_id, deleted, "Cleared devices for user");
        self.emit_cleared(format!("user {user_id}"), deleted);
        Ok(deleted)
    }

    async fn clear_all_devices(&self) -> Result<u64, AccessError> {
        let deleted = self.store.viewers().delete_all_devices().await?;
        warn!(deleted, "Cleared every registered device");
        self.emit_cleared("all".to_string(), deleted);
        Ok(deleted)
    }

    async fn active_subscription(&self, user_id: i32) -> Result<Option<Subscription>, AccessError> {
        Ok(self
            .store
            .subscriptions()
            .active_for_user(user_id, now_millis())
            .await?)
    }

    async fn get_subscription(&self, id: i32) -> Result<Subscription, AccessError> {
        self.store
            .subscriptions()
            .get(id)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("Subscription {id}")))
    }

    async fn subscription_details(
        &self,
        device_id: &str,
    ) -> Result<Option<SubscriptionDetails>, AccessError> {
        let viewers = self.store.viewers();
        let Some(device) = viewers.find_device(device_id).await? else {
            return Ok(None);
        };
        let Some(user) = viewers.get(device.user_id).await? else {
            return Ok(None);
        };

        let subscription = self.active_subscription(user.id).await?;
        let devices = viewers.devices_for_user(user.id).await?;

        Ok(Some(SubscriptionDetails {
            user,
            subscription,
            devices,
        }))
    }

    async fn check_premium_access(
        &self,
        device_id: Option<&str>,
        content: ContentRef,
    ) -> Result<PremiumAccess, AccessError> {
        if let ContentRef::Movie { slug } = &content {
            let settings = self.store.settings().get().await?;
            if settings.free_movie_of_week.as_deref() == Some(slug.as_str()) {
                return Ok(PremiumAccess::granted(AccessReason::FreeTier, None, None));
            }
        }

        let Some(device_id) = device_id.map(str::trim).filter(|d| !d.is_empty()) else {
            return Ok(PremiumAccess::denied(AccessReason::NoUser));
        };
        let viewers = self.store.viewers();
        let Some(device) = viewers.find_device(device_id).await? else {
            return Ok(PremiumAccess::denied(AccessReason::NoUser));
        };
        let Some(user) = viewers.get(device.user_id).await? else {
            return Ok(PremiumAccess::denied(AccessReason::NoUser));
        };

        if let Some(subscription) = self.active_subscription(user.id).await? {
            let plan = subscription.plan.parse::<Plan>().ok();
            let covers = match plan {
                Some(Plan::Match) => {
                    matches!(content, ContentRef::Match { id } if subscription.match_id == Some(id))
                }
                _ => true,
            };
            if covers {
                return Ok(PremiumAccess::granted(
                    AccessReason::Subscription,
                    plan,
                    Some(subscription.expires_at),
                ));
            }
        }

        if let Some(trial_end) = user.trial_expires_at
            && trial_end > now_millis()
        {
            return Ok(PremiumAccess::granted(
                AccessReason::Trial,
                None,
                Some(trial_end),
            ));
        }

        Ok(PremiumAccess::denied(AccessReason::NoActiveSubscription))
    }

    async fn create_subscription(
        &self,
        input: CreateSubscription,
    ) -> Result<Subscription, AccessError> {
        self.require_user(input.user_id).await?;

        let days = input.days.unwrap_or_else(|| input.plan.default_days());
        if days <= 0 {
            return Err(AccessError::Validation("days must be positive".to_string()));
        }

        let max_devices = match input.max_devices {
            Some(max) => max,
            None => self.store.settings().get().await?.max_devices_for(input.plan),
        };
        if max_devices <= 0 {
            return Err(AccessError::Validation(
                "max_devices must be positive".to_string(),
            ));
        }

        let subscription = self
            .store
            .subscriptions()
            .create(NewSubscription {
                user_id: input.user_id,
                plan: input.plan,
                match_id: input.match_id,
                expires_at: now_millis() + days * MILLIS_PER_DAY,
                max_devices,
                access_code: input.access_code,
            })
            .await?;

        info!(
            subscription_id = subscription.id,
            user_id = subscription.user_id,
            plan = %input.plan,
            days,
            "Subscription created"
        );
        let _ = self.event_bus.send(NotificationEvent::SubscriptionCreated {
            id: subscription.id,
            user_id: subscription.user_id,
            plan: subscription.plan.clone(),
        });

        Ok(subscription)
    }

    async fn update_status(
        &self,
        id: i32,
        status: SubscriptionStatus,
    ) -> Result<Subscription, AccessError> {
        let subscription = self
            .store
            .subscriptions()
            .set_status(id, status)
            .await?
            .ok_or_else(|| AccessError::NotFound(format!("Subscription {id}")))?;

        if status == SubscriptionStatus::Revoked {
            let _ = self
                .event_bus
                .send(NotificationEvent::SubscriptionRevoked { id });
        }
        Ok(subscription)
    }

    async fn revoke(&self, id: i32) -> Result<Subscription, AccessError> {
        self.update_status(id, SubscriptionStatus::Revoked).await
    }

    async fn expire_old(&self) -> Result<u64, AccessError> {
        let expired = self.store.subscriptions().expire_old(now_millis()).await?;
        if expired > 0 {
            info!(expired, "Expired old subscriptions");
        }
        Ok(expired)
    }

    async fn list_subscribers(
        &self,
        request: PageRequest,
        status: Option<SubscriptionStatus>,
        search: Option<&str>,
    ) -> Result<Page<SubscriberRow>, AccessError> {
        let (items, total) = self
            .store
            .subscriptions()
            .list_page(request, status, search)
            .await?;

        let user_ids: Vec<i32> = items.iter().map(|s| s.user_id).collect();
        let devices = self.store.viewers().devices_for_users(&user_ids).await?;
        let mut counts: HashMap<i32, u64> = HashMap::new();
        for device in devices {
            *counts.entry(device.user_id).or_default() += 1;
        }

        let rows = items
            .into_iter()
            .map(|subscription| SubscriberRow {
                device_count: counts.get(&subscription.user_id).copied().unwrap_or(0),
                subscription,
            })
            .collect();

        Ok(Page::new(rows, total, request))
    }
}
