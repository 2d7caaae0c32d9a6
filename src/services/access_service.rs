//! Viewers, their devices and the subscriptions that unlock premium content.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::repositories::subscription::Subscription;
use crate::db::repositories::user::{Device, Viewer};
use crate::domain::pagination::{Page, PageRequest};
use crate::domain::{Plan, SubscriptionStatus};

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Device is registered to another user")]
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

impl From<sea_orm::DbErr> for AccessError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AccessError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentifyResult {
    pub user: Viewer,
    pub device: Device,
    pub is_new: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct DeviceLimit {
    pub current_count: u64,
    pub max_allowed: i32,
    pub is_within_limit: bool,
}

impl DeviceLimit {
    #[must_use]
    pub fn new(current_count: u64, max_allowed: i32) -> Self {
        let max = u64::try_from(max_allowed).unwrap_or(0);
        Self {
            current_count,
            max_allowed,
            is_within_limit: current_count <= max,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionDetails {
    pub user: Viewer,
    pub subscription: Option<Subscription>,
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceOverview {
    pub user: Viewer,
    pub devices: Vec<Device>,
    pub limit: DeviceLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    FreeTier,
    NoUser,
    Subscription,
    Trial,
    NoActiveSubscription,
}

#[derive(Debug, Clone, Serialize)]
pub struct PremiumAccess {
    pub has_access: bool,
    pub reason: AccessReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<Plan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl PremiumAccess {
    #[must_use]
    pub const fn granted(reason: AccessReason, plan: Option<Plan>, expires_at: Option<i64>) -> Self {
        Self {
            has_access: true,
            reason,
            plan,
            expires_at,
        }
    }

    #[must_use]
    pub const fn denied(reason: AccessReason) -> Self {
        Self {
            has_access: false,
            reason,
            plan: None,
            expires_at: None,
        }
    }
}

/// What the viewer is trying to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    Movie { slug: String },
    Match { id: i32 },
    Any,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubscription {
    pub user_id: i32,
    pub plan: Plan,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub max_devices: Option<i32>,
    #[serde(default)]
    pub match_id: Option<i32>,
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriberRow {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub device_count: u64,
}

#[async_trait::async_trait]
pub trait AccessService: Send + Sync {
    /// Resolve a device to its viewer, creating both (with a trial) on first sight.
    async fn get_or_create_user(
        &self,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<IdentifyResult, AccessError>;

    /// # Errors
    ///
    /// [`AccessError::DeviceOwnedByAnotherUser`] or
    /// [`AccessError::DeviceLimitReached`] when the cap from [`Self::check_device_limit`] is full.
    async fn register_device(
        &self,
        user_id: i32,
        device_id: &str,
        user_agent: Option<&str>,
    ) -> Result<Device, AccessError>;

    async fn check_device_limit(&self, user_id: i32) -> Result<DeviceLimit, AccessError>;

    async fn remove_device(&self, device_id: &str) -> Result<u64, AccessError>;

    async fn devices_for_user(&self, user_id: i32) -> Result<DeviceOverview, AccessError>;

    async fn clear_user_devices(&self, user_id: i32) -> Result<u64, AccessError>;

    async fn clear_all_devices(&self) -> Result<u64, AccessError>;

    async fn active_subscription(&self, user_id: i32) -> Result<Option<Subscription>, AccessError>;

    async fn get_subscription(&self, id: i32) -> Result<Subscription, AccessError>;

    async fn subscription_details(
        &self,
        device_id: &str,
    ) -> Result<Option<SubscriptionDetails>, AccessError>;

    async fn check_premium_access(
        &self,
        device_id: Option<&str>,
        content: ContentRef,
    ) -> Result<PremiumAccess, AccessError>;

    async fn create_subscription(
        &self,
        input: CreateSubscription,
    ) -> Result<Subscription, AccessError>;

    async fn update_status(
        &self,
        id: i32,
        status: SubscriptionStatus,
    ) -> Result<Subscription, AccessError>;

    async fn revoke(&self, id: i32) -> Result<Subscription, AccessError>;

    async fn expire_old(&self) -> Result<u64, AccessError>;

    async fn list_subscribers(
        &self,
        request: PageRequest,
        status: Option<SubscriptionStatus>,
        search: Option<&str>,
    ) -> Result<Page<SubscriberRow>, AccessError>;
}
