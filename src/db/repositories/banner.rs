use crate::domain::now_millis;
use crate::entities::{prelude::*, promo_banners};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;

pub use promo_banners::Model as PromoBanner;

pub struct BannerRepository {
    conn: DatabaseConnection,
}

impl BannerRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Ordered by priority, highest first. `active_at` keeps only active
    /// banners whose date window contains that instant.
    pub async fn list(
        &self,
        banner_type: Option<&str>,
        active_at: Option<i64>,
    ) -> Result<Vec<PromoBanner>> {
        let mut query = PromoBanners::find().order_by_desc(promo_banners::Column::Priority);

        if let Some(kind) = banner_type {
            query = query.filter(promo_banners::Column::BannerType.eq(kind));
        }
        if active_at.is_some() {
            query = query.filter(promo_banners::Column::IsActive.eq(true));
        }

        let rows = query.all(&self.conn).await?;
        Ok(match active_at {
            Some(now) => rows
                .into_iter()
                .filter(|b| b.start_date.is_none_or(|start| start <= now))
                .filter(|b| b.end_date.is_none_or(|end| end >= now))
                .collect(),
            None => rows,
        })
    }

    pub async fn create(&self, input: NewBanner) -> Result<PromoBanner> {
        let now = now_millis();
        let model = promo_banners::ActiveModel {
            name: Set(input.name),
            banner_type: Set(input.banner_type),
            headline: Set(input.headline),
            subheadline: Set(input.subheadline),
            cta_text: Set(input.cta_text),
            cta_link: Set(input.cta_link),
            left_image_url: Set(input.left_image_url),
            right_image_url: Set(input.right_image_url),
            background_image_url: Set(input.background_image_url),
            background_color: Set(input.background_color),
            accent_color: Set(input.accent_color),
            start_date: Set(input.start_date),
            end_date: Set(input.end_date),
            is_active: Set(input.is_active),
            priority: Set(input.priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(model)
    }

    pub async fn update(&self, id: i32, patch: BannerPatch) -> Result<Option<PromoBanner>> {
        let Some(existing) = PromoBanners::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: promo_banners::ActiveModel = existing.into();
        if let Some(v) = patch.name {
            active.name = Set(v);
        }
        if let Some(v) = patch.banner_type {
            active.banner_type = Set(v);
        }
        if let Some(v) = patch.headline {
            active.headline = Set(v);
        }
        if let Some(v) = patch.subheadline {
            active.subheadline = Set(Some(v));
        }
        if let Some(v) = patch.cta_text {
            active.cta_text = Set(Some(v));
        }
        if let Some(v) = patch.cta_link {
            active.cta_link = Set(Some(v));
        }
        if let Some(v) = patch.left_image_url {
            active.left_image_url = Set(Some(v));
        }
        if let Some(v) = patch.right_image_url {
            active.right_image_url = Set(Some(v));
        }
        if let Some(v) = patch.background_image_url {
            active.background_image_url = Set(Some(v));
        }
        if let Some(v) = patch.background_color {
            active.background_color = Set(Some(v));
        }
        if let Some(v) = patch.accent_color {
            active.accent_color = Set(Some(v));
        }
        if let Some(v) = patch.start_date {
            active.start_date = Set(Some(v));
        }
        if let Some(v) = patch.end_date {
            active.end_date = Set(Some(v));
        }
        if let Some(v) = patch.is_active {
            active.is_active = Set(v);
        }
        if let Some(v) = patch.priority {
            active.priority = Set(v);
        }
        active.updated_at = Set(now_millis());

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = PromoBanners::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBanner {
    pub name: String,
    #[serde(rename = "type")]
    pub banner_type: String,
    pub headline: String,
    #[serde(default)]
    pub subheadline: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_link: Option<String>,
    #[serde(default)]
    pub left_image_url: Option<String>,
    #[serde(default)]
    pub right_image_url: Option<String>,
    #[serde(default)]
    pub background_image_url: Option<String>,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
    #[serde(default)]
    pub start_date: Option<i64>,
    #[serde(default)]
    pub end_date: Option<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub priority: i32,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BannerPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub banner_type: Option<String>,
    pub headline: Option<String>,
    pub subheadline: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub left_image_url: Option<String>,
    pub right_image_url: Option<String>,
    pub background_image_url: Option<String>,
    pub background_color: Option<String>,
    pub accent_color: Option<String>,
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    pub is_active: Option<bool>,
    pub priority: Option<i32>,
}
