//! Pay-per-view configuration, access checks and ad-supported unlocking.

use serde::Serialize;
use thiserror::Error;

use crate::db::repositories::ppv::{PpvConfig, PpvConfigInput, PpvStats};
use crate::domain::ppv_gate::GateState;
use crate::domain::{AccessType, ContentType};

#[derive(Debug, Error)]
pub enum PpvError {
    #[error("PPV content not found")]
    NotFound,

    #[error("Ad-supported access is not enabled for this content")]
    AdSupportDisabled,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for PpvError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for PpvError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Answer to "may this viewer play this item right now".
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheck {
    pub has_access: bool,
    pub is_ppv: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_type: Option<AccessType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ads_watched: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ads_required: Option<i32>,
    /// Player gate derived from the stored counters.
    pub gate: GateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppv_content: Option<PpvConfig>,
}

impl AccessCheck {
    #[must_use]
    pub const fn free() -> Self {
        Self {
            has_access: true,
            is_ppv: false,
            access_type: None,
            expires_at: None,
            ads_watched: None,
            ads_required: None,
            gate: GateState::Open,
            ppv_content: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AdWatchResult {
    pub success: bool,
    pub ads_watched: i32,
    pub ads_required: i32,
    pub is_unlocked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub gate: GateState,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaidPurchase {
    pub purchase_id: i32,
    pub price: f64,
    pub expires_at: i64,
}

#[async_trait::async_trait]
pub trait PpvService: Send + Sync {
    async fn get_config(
        &self,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<Option<PpvConfig>, PpvError>;

    async fn list_configs(&self, content_type: Option<ContentType>)
    -> Result<Vec<PpvConfig>, PpvError>;

    async fn has_active(&self, content_type: ContentType, content_id: &str)
    -> Result<bool, PpvError>;

    async fn upsert_config(&self, input: PpvConfigInput) -> Result<PpvConfig, PpvError>;

    async fn delete_config(&self, id: i32) -> Result<(), PpvError>;

    async fn stats(&self) -> Result<PpvStats, PpvError>;

    async fn check_access(
        &self,
        content_type: ContentType,
        content_id: &str,
        user_id: Option<i32>,
    ) -> Result<AccessCheck, PpvError>;

    /// Count one completed ad towards unlocking `content_id` for `user_id`.
    ///
    /// # Errors
    ///
    /// [`PpvError::NotFound`] without an active config, and
    /// [`PpvError::AdSupportDisabled`] when the config only allows paid access.
    async fn record_ad_watch(
        &self,
        user_id: i32,
        device_id: Option<&str>,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<AdWatchResult, PpvError>;

    async fn create_paid_purchase(
        &self,
        user_id: i32,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<PaidPurchase, PpvError>;
}
