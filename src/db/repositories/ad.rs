use crate::domain::{AdFormat, AdImpressionType, AdNetwork, decode_list, encode_list, now_millis};
use crate::entities::{ad_impressions, ads, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

/// Slots created disabled by `seed`.
pub const DEFAULT_SLOTS: &[&str] = &[
    "home_top",
    "home_middle",
    "match_below_player",
    "match_sidebar",
    "blog_in_content_1",
    "blog_in_content_2",
    "archive_sidebar",
];

pub struct AdRepository {
    conn: DatabaseConnection,
}

impl AdRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: ads::Model) -> AdSlot {
        AdSlot {
            id: m.id,
            slot_key: m.slot_key,
            network: m.network.parse().unwrap_or(AdNetwork::Custom),
            format: m.format.parse().unwrap_or(AdFormat::Responsive),
            code_html: m.code_html,
            adsense_client: m.adsense_client,
            adsense_slot: m.adsense_slot,
            adsterra_key: m.adsterra_key,
            adsterra_domain: m.adsterra_domain,
            monetag_id: m.monetag_id,
            vast_url: m.vast_url,
            video_url: m.video_url,
            video_skip_after: m.video_skip_after,
            popup_url: m.popup_url,
            show_on: decode_list(&m.show_on),
            enabled: m.enabled,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    // ========================================================================
    // Slots
    // ========================================================================

    pub async fn list(&self) -> Result<Vec<AdSlot>> {
        let rows = Ads::find()
            .order_by_asc(ads::Column::SlotKey)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get_by_slot(&self, slot_key: &str) -> Result<Option<AdSlot>> {
        Ok(Ads::find()
            .filter(ads::Column::SlotKey.eq(slot_key))
            .one(&self.conn)
            .await?
            .map(Self::map_model))
    }

    /// Enabled slots that list `page` in `show_on`.
    pub async fn for_page(&self, page: &str) -> Result<Vec<AdSlot>> {
        let rows = Ads::find()
            .filter(ads::Column::Enabled.eq(true))
            .order_by_asc(ads::Column::SlotKey)
            .all(&self.conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(Self::map_model)
            .filter(|slot| slot.show_on.iter().any(|p| p == page))
            .collect())
    }

    pub async fn create(&self, input: NewAdSlot) -> Result<AdSlot> {
        let now = now_millis();
        let model = ads::ActiveModel {
            slot_key: Set(input.slot_key),
            network: Set(input.network.as_str().to_string()),
            format: Set(input.format.as_str().to_string()),
            code_html: Set(input.code_html),
            adsense_client: Set(input.adsense_client),
            adsense_slot: Set(input.adsense_slot),
            adsterra_key: Set(input.adsterra_key),
            adsterra_domain: Set(input.adsterra_domain),
            monetag_id: Set(input.monetag_id),
            vast_url: Set(input.vast_url),
            video_url: Set(input.video_url),
            video_skip_after: Set(input.video_skip_after),
            popup_url: Set(input.popup_url),
            show_on: Set(encode_list(&input.show_on)),
            enabled: Set(input.enabled),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(Self::map_model(model))
    }

    pub async fn update(&self, id: i32, patch: AdSlotPatch) -> Result<Option<AdSlot>> {
        let Some(existing) = Ads::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: ads::ActiveModel = existing.into();
        if let Some(v) = patch.network {
            active.network = Set(v.as_str().to_string());
        }
        if let Some(v) = patch.format {
            active.format = Set(v.as_str().to_string());
        }
        if let Some(v) = patch.code_html {
            active.code_html = Set(Some(v));
        }
        if let Some(v) = patch.adsense_client {
            active.adsense_client = Set(Some(v));
        }
        if let Some(v) = patch.adsense_slot {
            active.adsense_slot = Set(Some(v));
        }
        if let Some(v) = patch.adsterra_key {
            active.adsterra_key = Set(Some(v));
        }
        if let Some(v) = patch.adsterra_domain {
            active.adsterra_domain = Set(Some(v));
        }
        if let Some(v) = patch.monetag_id {
            active.monetag_id = Set(Some(v));
        }
        if let Some(v) = patch.vast_url {
            active.vast_url = Set(Some(v));
        }
        if let Some(v) = patch.video_url {
            active.video_url = Set(Some(v));
        }
        if let Some(v) = patch.video_skip_after {
            active.video_skip_after = Set(Some(v));
        }
        if let Some(v) = patch.popup_url {
            active.popup_url = Set(Some(v));
        }
        if let Some(v) = patch.show_on {
            active.show_on = Set(encode_list(&v));
        }
        if let Some(v) = patch.enabled {
            active.enabled = Set(v);
        }
        active.updated_at = Set(now_millis());

        Ok(Some(Self::map_model(active.update(&self.conn).await?)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Ads::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Flips `enabled` and returns the new value, or `None` for an unknown id.
    pub async fn toggle(&self, id: i32) -> Result<Option<bool>> {
        let Some(existing) = Ads::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };
        let enabled = !existing.enabled;

        Ads::update_many()
            .col_expr(ads::Column::Enabled, Expr::value(enabled))
            .col_expr(ads::Column::UpdatedAt, Expr::value(now_millis()))
            .filter(ads::Column::Id.eq(id))
            .exec(&self.conn)
            .await?;
        Ok(Some(enabled))
    }

    /// Returns false when slots already exist.
    pub async fn seed(&self) -> Result<bool> {
        if Ads::find().count(&self.conn).await? > 0 {
            return Ok(false);
        }

        let now = now_millis();
        let rows = DEFAULT_SLOTS.iter().map(|key| ads::ActiveModel {
            slot_key: Set((*key).to_string()),
            network: Set(AdNetwork::Custom.as_str().to_string()),
            format: Set(AdFormat::Responsive.as_str().to_string()),
            show_on: Set("[]".to_string()),
            enabled: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        });
        Ads::insert_many(rows).exec(&self.conn).await?;
        Ok(true)
    }

    // ========================================================================
    // Impressions
    // ========================================================================

    pub async fn record_impression(&self, impression: NewImpression) -> Result<i32> {
        let model = ad_impressions::ActiveModel {
            user_id: Set(impression.user_id),
            device_id: Set(impression.device_id),
            ad_type: Set(impression.ad_type.as_str().to_string()),
            ad_slot: Set(impression.ad_slot),
            content_type: Set(impression.content_type),
            content_id: Set(impression.content_id),
            completed: Set(impression.completed),
            created_at: Set(now_millis()),
            ..Default::default()
        };
        let res = AdImpressions::insert(model).exec(&self.conn).await?;
        Ok(res.last_insert_id)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct AdSlot {
    pub id: i32,
    pub slot_key: String,
    pub network: AdNetwork,
    pub format: AdFormat,
    pub code_html: Option<String>,
    pub adsense_client: Option<String>,
    pub adsense_slot: Option<String>,
    pub adsterra_key: Option<String>,
    pub adsterra_domain: Option<String>,
    pub monetag_id: Option<String>,
    pub vast_url: Option<String>,
    pub video_url: Option<String>,
    pub video_skip_after: Option<i32>,
    pub popup_url: Option<String>,
    pub show_on: Vec<String>,
    pub enabled: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAdSlot {
    pub slot_key: String,
    pub network: AdNetwork,
    pub format: AdFormat,
    #[serde(default)]
    pub code_html: Option<String>,
    #[serde(default)]
    pub adsense_client: Option<String>,
    #[serde(default)]
    pub adsense_slot: Option<String>,
    #[serde(default)]
    pub adsterra_key: Option<String>,
    #[serde(default)]
    pub adsterra_domain: Option<String>,
    #[serde(default)]
    pub monetag_id: Option<String>,
    #[serde(default)]
    pub vast_url: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub video_skip_after: Option<i32>,
    #[serde(default)]
    pub popup_url: Option<String>,
    #[serde(default)]
    pub show_on: Vec<String>,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AdSlotPatch {
    pub network: Option<AdNetwork>,
    pub format: Option<AdFormat>,
    pub code_html: Option<String>,
    pub adsense_client: Option<String>,
    pub adsense_slot: Option<String>,
    pub adsterra_key: Option<String>,
    pub adsterra_domain: Option<String>,
    pub monetag_id: Option<String>,
    pub vast_url: Option<String>,
    pub video_url: Option<String>,
    pub video_skip_after: Option<i32>,
    pub popup_url: Option<String>,
    pub show_on: Option<Vec<String>>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewImpression {
    #[serde(default)]
    pub user_id: Option<i32>,
    #[serde(default)]
    pub device_id: Option<String>,
    pub ad_type: AdImpressionType,
    pub ad_slot: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default = "default_completed")]
    pub completed: bool,
}

const fn default_completed() -> bool {
    true
}
