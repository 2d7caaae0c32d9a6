use crate::domain::{SlideContentType, now_millis};
use crate::entities::{hero_slides, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

pub struct HeroSlideRepository {
    conn: DatabaseConnection,
}

impl HeroSlideRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: hero_slides::Model) -> HeroSlide {
        HeroSlide {
            id: m.id,
            content_type: m.content_type.parse().unwrap_or(SlideContentType::Custom),
            content_id: m.content_id,
            title: m.title,
            subtitle: m.subtitle,
            description: m.description,
            image_url: m.image_url,
            cta_text: m.cta_text,
            cta_link: m.cta_link,
            order: m.sort_order,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<HeroSlide>> {
        let mut query = HeroSlides::find().order_by_asc(hero_slides::Column::SortOrder);
        if active_only {
            query = query.filter(hero_slides::Column::IsActive.eq(true));
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    async fn max_order(&self) -> Result<i32> {
        let max: Option<Option<i32>> = HeroSlides::find()
            .select_only()
            .column_as(hero_slides::Column::SortOrder.max(), "max_order")
            .into_tuple()
            .one(&self.conn)
            .await?;
        Ok(max.flatten().unwrap_or(0))
    }

    /// New slides go to the end of the carousel.
    pub async fn create(&self, input: NewHeroSlide) -> Result<HeroSlide> {
        let order = self.max_order().await? + 1;
        let model = hero_slides::ActiveModel {
            content_type: Set(input.content_type.as_str().to_string()),
            content_id: Set(input.content_id),
            title: Set(input.title),
            subtitle: Set(input.subtitle),
            description: Set(input.description),
            image_url: Set(input.image_url),
            cta_text: Set(input.cta_text),
            cta_link: Set(input.cta_link),
            sort_order: Set(order),
            is_active: Set(input.is_active),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(Self::map_model(model))
    }

    pub async fn update(&self, id: i32, patch: HeroSlidePatch) -> Result<Option<HeroSlide>> {
        let Some(existing) = HeroSlides::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: hero_slides::ActiveModel = existing.into();
        if let Some(v) = patch.content_type {
            active.content_type = Set(v.as_str().to_string());
        }
        if let Some(v) = patch.content_id {
            active.content_id = Set(Some(v));
        }
        if let Some(v) = patch.title {
            active.title = Set(Some(v));
        }
        if let Some(v) = patch.subtitle {
            active.subtitle = Set(Some(v));
        }
        if let Some(v) = patch.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = patch.image_url {
            active.image_url = Set(Some(v));
        }
        if let Some(v) = patch.cta_text {
            active.cta_text = Set(Some(v));
        }
        if let Some(v) = patch.cta_link {
            active.cta_link = Set(Some(v));
        }
        if let Some(v) = patch.is_active {
            active.is_active = Set(v);
        }

        Ok(Some(Self::map_model(active.update(&self.conn).await?)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = HeroSlides::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Position `i` in `ids` gets order `i + 1`.
    pub async fn reorder(&self, ids: &[i32]) -> Result<()> {
        let txn = self.conn.begin().await?;
        for (id, order) in ids.iter().zip(1..) {
            HeroSlides::update_many()
                .col_expr(hero_slides::Column::SortOrder, Expr::value(order))
                .filter(hero_slides::Column::Id.eq(*id))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;
        Ok(())
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct HeroSlide {
    pub id: i32,
    pub content_type: SlideContentType,
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub order: i32,
    pub is_active: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHeroSlide {
    pub content_type: SlideContentType,
    #[serde(default)]
    pub content_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub cta_text: Option<String>,
    #[serde(default)]
    pub cta_link: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HeroSlidePatch {
    pub content_type: Option<SlideContentType>,
    pub content_id: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub cta_text: Option<String>,
    pub cta_link: Option<String>,
    pub is_active: Option<bool>,
}
