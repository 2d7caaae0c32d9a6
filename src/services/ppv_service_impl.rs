use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use crate::constants::ppv::UNLOCK_AD_SLOT;
use crate::constants::time::MILLIS_PER_HOUR;
use crate::db::Store;
use crate::db::repositories::ad::NewImpression;
use crate::db::repositories::ppv::{NewPurchase, PpvConfig, PpvConfigInput, PpvStats};
use crate::domain::events::NotificationEvent;
use crate::domain::ppv_gate::{GateState, PpvGate};
use crate::domain::{AccessType, AdImpressionType, ContentType, now_millis};
use crate::services::ppv_service::{AccessCheck, AdWatchResult, PaidPurchase, PpvError, PpvService};

pub struct SeaOrmPpvService {
    store: Store,
    event_bus: broadcast::Sender<NotificationEvent>,
}

impl SeaOrmPpvService {
    #[must_use]
    pub const fn new(store: Store, event_bus: broadcast::Sender<NotificationEvent>) -> Self {
        Self { store, event_bus }
    }

    async fn active_config(
        &self,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<Option<PpvConfig>, PpvError> {
        let config = self.store.ppv().get_config(content_type, content_id).await?;
        Ok(config.filter(|c| c.is_active))
    }
}

fn access_millis(config: &PpvConfig) -> i64 {
    i64::from(config.access_duration_hours) * MILLIS_PER_HOUR
}

fn gate_for(watched: i32, required: i32, expires_at: i64, now: i64) -> GateState {
    let count = |n: i32| u32::try_from(n).unwrap_or(0);
    PpvGate::evaluate(count(watched), count(required), expires_at, now).state()
}

#[async_trait]
impl PpvService for SeaOrmPpvService {
    async fn get_config(
        &self,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<Option<PpvConfig>, PpvError> {
        Ok(self.store.ppv().get_config(content_type, content_id).await?)
    }

    async fn list_configs(
        &self,
        content_type: Option<ContentType>,
    ) -> Result<Vec<PpvConfig>, PpvError> {
        Ok(self.store.ppv().list_configs(content_type).await?)
    }

    async fn has_active(
        &self,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<bool, PpvError> {
        Ok(self.active_config(content_type, content_id).await?.is_some())
    }

    async fn upsert_config(&self, input: PpvConfigInput) -> Result<PpvConfig, PpvError> {
        if input.content_id.trim().is_empty() {
            return Err(PpvError::Validation("content_id is required".to_string()));
        }
        if input.min_ads_required < 0 {
            return Err(PpvError::Validation(
                "min_ads_required cannot be negative".to_string(),
            ));
        }
        if input.access_duration_hours <= 0 {
            return Err(PpvError::Validation(
                "access_duration_hours must be positive".to_string(),
            ));
        }
        if input.price < 0.0 {
            return Err(PpvError::Validation("price cannot be negative".to_string()));
        }

        Ok(self.store.ppv().upsert_config(input).await?)
    }

    async fn delete_config(&self, id: i32) -> Result<(), PpvError> {
        if self.store.ppv().delete_config(id).await? {
            Ok(())
        } else {
            Err(PpvError::NotFound)
        }
    }

    async fn stats(&self) -> Result<PpvStats, PpvError> {
        let ppv = self.store.ppv();
        let total = ppv.count_purchases(None).await?;
        let active = ppv.count_purchases(Some(now_millis())).await?;
        let (paid, ad_supported) = ppv.purchase_counts().await?;
        let total_revenue = crate::domain::round2(ppv.paid_revenue().await?);

        Ok(PpvStats {
            total,
            active,
            paid,
            ad_supported,
            total_revenue,
        })
    }

    async fn check_access(
        &self,
        content_type: ContentType,
        content_id: &str,
        user_id: Option<i32>,
    ) -> Result<AccessCheck, PpvError> {
        let Some(config) = self.active_config(content_type, content_id).await? else {
            return Ok(AccessCheck::free());
        };

        let now = now_millis();
        let locked = |ads_watched: i32, expires_at: i64, config: PpvConfig| AccessCheck {
            has_access: false,
            is_ppv: true,
            access_type: None,
            expires_at: None,
            ads_watched: Some(ads_watched),
            ads_required: Some(config.min_ads_required),
            gate: gate_for(ads_watched, config.min_ads_required, expires_at, now),
            ppv_content: Some(config),
        };

        let Some(user_id) = user_id else {
            return Ok(locked(0, 0, config));
        };

        let ppv = self.store.ppv();
        if let Some(active) = ppv
            .find_active_purchase(user_id, content_type, content_id, now)
            .await?
        {
            return Ok(AccessCheck {
                has_access: true,
                is_ppv: true,
                access_type: active.access_type.parse().ok(),
                expires_at: Some(active.expires_at),
                ads_watched: None,
                ads_required: None,
                gate: GateState::Unlocked {
                    expires_at: active.expires_at,
                },
                ppv_content: None,
            });
        }

        match ppv.find_ad_purchase(user_id, content_type, content_id).await? {
            // An expired unlock starts over.
            Some(p) if p.expires_at > 0 => Ok(locked(0, p.expires_at, config)),
            Some(p) => Ok(locked(p.ads_watched, 0, config)),
            None => Ok(locked(0, 0, config)),
        }
    }

    async fn record_ad_watch(
        &self,
        user_id: i32,
        device_id: Option<&str>,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<AdWatchResult, PpvError> {
        let config = self
            .active_config(content_type, content_id)
            .await?
            .ok_or(PpvError::NotFound)?;

        if !config.ad_supported_enabled {
            return Err(PpvError::AdSupportDisabled);
        }

        self.store
            .ads()
            .record_impression(NewImpression {
                user_id: Some(user_id),
                device_id: device_id.map(str::to_string),
                ad_type: AdImpressionType::PpvUnlock,
                ad_slot: UNLOCK_AD_SLOT.to_string(),
                content_type: Some(content_type.as_str().to_string()),
                content_id: Some(content_id.to_string()),
                completed: true,
            })
            .await?;

        let ppv = self.store.ppv();
        let now = now_millis();
        let required = config.min_ads_required;

        if let Some(active) = ppv
            .find_active_purchase(user_id, content_type, content_id, now)
            .await?
        {
            // Still unlocked: nothing to count.
            return Ok(AdWatchResult {
                success: true,
                ads_watched: active.ads_watched.max(required),
                ads_required: required,
                is_unlocked: true,
                expires_at: Some(active.expires_at),
                gate: GateState::Unlocked {
                    expires_at: active.expires_at,
                },
            });
        }

        // Only an in-progress ad row keeps counting. An expired one is kept as
        // history and the sequence restarts on a fresh row.
        let in_progress = ppv
            .find_ad_purchase(user_id, content_type, content_id)
            .await?
            .filter(|p| p.expires_at == 0);

        let ads_watched = in_progress.as_ref().map_or(0, |p| p.ads_watched) + 1;
        let is_unlocked = ads_watched >= required;
        let expires_at = if is_unlocked {
            now + access_millis(&config)
        } else {
            0
        };

        match in_progress {
            Some(purchase) => {
                ppv.update_purchase_progress(purchase, ads_watched, expires_at)
                    .await?;
            }
            None => {
                ppv.insert_purchase(NewPurchase {
                    user_id,
                    content_type,
                    content_id: content_id.to_string(),
                    ppv_content_id: config.id,
                    price: 0.0,
                    access_type: AccessType::AdSupported,
                    ads_watched,
                    expires_at,
                })
                .await?;
            }
        }

        if is_unlocked {
            info!(
                user_id,
                content_type = %content_type,
                content_id,
                expires_at,
                "PPV content unlocked with ads"
            );
            let _ = self.event_bus.send(NotificationEvent::PpvUnlocked {
                user_id,
                content_type: content_type.as_str().to_string(),
                content_id: content_id.to_string(),
                expires_at,
            });
        }

        Ok(AdWatchResult {
            success: true,
            ads_watched,
            ads_required: required,
            is_unlocked,
            expires_at: is_unlocked.then_some(expires_at),
            gate: gate_for(ads_watched, required, expires_at, now),
        })
    }

    async fn create_paid_purchase(
        &self,
        user_id: i32,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<PaidPurchase, PpvError> {
        let config = self
            .active_config(content_type, content_id)
            .await?
            .ok_or(PpvError::NotFound)?;

        let expires_at = now_millis() + access_millis(&config);
        let purchase = self
            .store
            .ppv()
            .insert_purchase(NewPurchase {
                user_id,
                content_type,
                content_id: content_id.to_string(),
                ppv_content_id: config.id,
                price: config.price,
                access_type: AccessType::Paid,
                ads_watched: 0,
                expires_at,
            })
            .await?;

        let _ = self.event_bus.send(NotificationEvent::PpvUnlocked {
            user_id,
            content_type: content_type.as_str().to_string(),
            content_id: content_id.to_string(),
            expires_at,
        });

        Ok(PaidPurchase {
            purchase_id: purchase.id,
            price: purchase.price,
            expires_at,
        })
    }
}
