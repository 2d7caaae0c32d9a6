use crate::domain::{AccessType, ContentType, now_millis};
use crate::entities::{ppv_content, ppv_purchases, prelude::*};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

pub use ppv_content::Model as PpvConfig;
pub use ppv_purchases::Model as PpvPurchase;

pub struct PpvRepository {
    conn: DatabaseConnection,
}

impl PpvRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Content configuration
    // ========================================================================

    pub async fn get_config(
        &self,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<Option<PpvConfig>> {
        Ok(PpvContent::find()
            .filter(ppv_content::Column::ContentType.eq(content_type.as_str()))
            .filter(ppv_content::Column::ContentId.eq(content_id))
            .one(&self.conn)
            .await?)
    }

    pub async fn list_configs(&self, content_type: Option<ContentType>) -> Result<Vec<PpvConfig>> {
        let mut query = PpvContent::find().order_by_desc(ppv_content::Column::CreatedAt);
        if let Some(kind) = content_type {
            query = query.filter(ppv_content::Column::ContentType.eq(kind.as_str()));
        }
        Ok(query.all(&self.conn).await?)
    }

    /// Updates by id when given, otherwise by `(content_type, content_id)`,
    /// inserting when neither matches.
    pub async fn upsert_config(&self, input: PpvConfigInput) -> Result<PpvConfig> {
        let existing = match input.id {
            Some(id) => PpvContent::find_by_id(id).one(&self.conn).await?,
            None => self.get_config(input.content_type, &input.content_id).await?,
        };
        let now = now_millis();

        let model = if let Some(existing) = existing {
            let mut active: ppv_content::ActiveModel = existing.into();
            active.content_type = Set(input.content_type.as_str().to_string());
            active.content_id = Set(input.content_id);
            active.title = Set(input.title);
            active.price = Set(input.price);
            active.ad_supported_enabled = Set(input.ad_supported_enabled);
            active.min_ads_required = Set(input.min_ads_required);
            active.access_duration_hours = Set(input.access_duration_hours);
            active.is_active = Set(input.is_active);
            active.updated_at = Set(now);
            active.update(&self.conn).await?
        } else {
            ppv_content::ActiveModel {
                content_type: Set(input.content_type.as_str().to_string()),
                content_id: Set(input.content_id),
                title: Set(input.title),
                price: Set(input.price),
                ad_supported_enabled: Set(input.ad_supported_enabled),
                min_ads_required: Set(input.min_ads_required),
                access_duration_hours: Set(input.access_duration_hours),
                is_active: Set(input.is_active),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&self.conn)
            .await?
        };

        Ok(model)
    }

    pub async fn delete_config(&self, id: i32) -> Result<bool> {
        let result = PpvContent::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    /// Longest-running unexpired purchase of any access type.
    pub async fn find_active_purchase(
        &self,
        user_id: i32,
        content_type: ContentType,
        content_id: &str,
        now: i64,
    ) -> Result<Option<PpvPurchase>> {
        Ok(PpvPurchases::find()
            .filter(ppv_purchases::Column::UserId.eq(user_id))
            .filter(ppv_purchases::Column::ContentType.eq(content_type.as_str()))
            .filter(ppv_purchases::Column::ContentId.eq(content_id))
            .filter(ppv_purchases::Column::ExpiresAt.gt(now))
            .order_by_desc(ppv_purchases::Column::ExpiresAt)
            .one(&self.conn)
            .await?)
    }

    /// Latest ad-supported row, which carries the ad counter.
    /// Paid rows are never touched by ad progress.
    pub async fn find_ad_purchase(
        &self,
        user_id: i32,
        content_type: ContentType,
        content_id: &str,
    ) -> Result<Option<PpvPurchase>> {
        Ok(PpvPurchases::find()
            .filter(ppv_purchases::Column::UserId.eq(user_id))
            .filter(ppv_purchases::Column::ContentType.eq(content_type.as_str()))
            .filter(ppv_purchases::Column::ContentId.eq(content_id))
            .filter(ppv_purchases::Column::AccessType.eq(AccessType::AdSupported.as_str()))
            .order_by_desc(ppv_purchases::Column::CreatedAt)
            .order_by_desc(ppv_purchases::Column::Id)
            .one(&self.conn)
            .await?)
    }

    pub async fn insert_purchase(&self, purchase: NewPurchase) -> Result<PpvPurchase> {
        let model = ppv_purchases::ActiveModel {
            user_id: Set(purchase.user_id),
            content_type: Set(purchase.content_type.as_str().to_string()),
            content_id: Set(purchase.content_id),
            ppv_content_id: Set(purchase.ppv_content_id),
            price: Set(purchase.price),
            access_type: Set(purchase.access_type.as_str().to_string()),
            ads_watched: Set(purchase.ads_watched),
            expires_at: Set(purchase.expires_at),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(model)
    }

    pub async fn update_purchase_progress(
        &self,
        purchase: PpvPurchase,
        ads_watched: i32,
        expires_at: i64,
    ) -> Result<PpvPurchase> {
        let mut active: ppv_purchases::ActiveModel = purchase.into();
        active.ads_watched = Set(ads_watched);
        active.expires_at = Set(expires_at);
        Ok(active.update(&self.conn).await?)
    }

    /// All purchases, or only those still running at `active_at`.
    pub async fn count_purchases(&self, active_at: Option<i64>) -> Result<u64> {
        let mut query = PpvPurchases::find();
        if let Some(now) = active_at {
            query = query.filter(ppv_purchases::Column::ExpiresAt.gt(now));
        }
        Ok(query.count(&self.conn).await?)
    }

    pub async fn purchase_counts(&self) -> Result<(u64, u64)> {
        let paid = PpvPurchases::find()
            .filter(ppv_purchases::Column::AccessType.eq(AccessType::Paid.as_str()))
            .count(&self.conn)
            .await?;
        let ad_supported = PpvPurchases::find()
            .filter(ppv_purchases::Column::AccessType.eq(AccessType::AdSupported.as_str()))
            .count(&self.conn)
            .await?;
        Ok((paid, ad_supported))
    }

    pub async fn paid_revenue(&self) -> Result<f64> {
        let total: Option<Option<f64>> = PpvPurchases::find()
            .select_only()
            .column_as(ppv_purchases::Column::Price.sum(), "total")
            .filter(ppv_purchases::Column::AccessType.eq(AccessType::Paid.as_str()))
            .into_tuple()
            .one(&self.conn)
            .await?;
        Ok(total.flatten().unwrap_or(0.0))
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PpvConfigInput {
    #[serde(default)]
    pub id: Option<i32>,
    pub content_type: ContentType,
    pub content_id: String,
    pub title: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default = "default_true")]
    pub ad_supported_enabled: bool,
    #[serde(default = "default_min_ads")]
    pub min_ads_required: i32,
    #[serde(default = "default_duration_hours")]
    pub access_duration_hours: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

const fn default_min_ads() -> i32 {
    3
}

const fn default_duration_hours() -> i32 {
    24
}

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub user_id: i32,
    pub content_type: ContentType,
    pub content_id: String,
    pub ppv_content_id: i32,
    pub price: f64,
    pub access_type: AccessType,
    pub ads_watched: i32,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PpvStats {
    /// Purchases of any access type.
    pub total: u64,
    /// Purchases whose `expires_at` is still in the future.
    pub active: u64,
    pub paid: u64,
    pub ad_supported: u64,
    pub total_revenue: f64,
}
