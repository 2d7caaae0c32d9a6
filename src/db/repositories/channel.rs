use crate::domain::{Embed, decode_list, encode_list, now_millis};
use crate::entities::{channels, prelude::*};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

pub struct ChannelRepository {
    conn: DatabaseConnection,
}

impl ChannelRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: channels::Model) -> Channel {
        Channel {
            id: m.id,
            slug: m.slug,
            name: m.name,
            description: m.description,
            thumbnail_url: m.thumbnail_url,
            category: m.category,
            embeds: decode_list(&m.embeds),
            is_premium: m.is_premium,
            is_live: m.is_live,
            priority: m.priority,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    pub async fn list(&self, filter: &ChannelFilter) -> Result<Vec<Channel>> {
        let mut query = Channels::find().order_by_desc(channels::Column::Priority);

        if let Some(slug) = &filter.slug {
            query = query.filter(channels::Column::Slug.eq(slug.as_str()));
        }
        if let Some(category) = &filter.category {
            query = query.filter(channels::Column::Category.eq(category.as_str()));
        }
        if let Some(live) = filter.is_live {
            query = query.filter(channels::Column::IsLive.eq(live));
        }
        if let Some(premium) = filter.is_premium {
            query = query.filter(channels::Column::IsPremium.eq(premium));
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Channel>> {
        Ok(Channels::find_by_id(id)
            .one(&self.conn)
            .await?
            .map(Self::map_model))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Channel>> {
        Ok(Channels::find()
            .filter(channels::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?
            .map(Self::map_model))
    }

    pub async fn create(&self, input: NewChannel) -> Result<Channel> {
        let now = now_millis();
        let model = channels::ActiveModel {
            slug: Set(input.slug),
            name: Set(input.name),
            description: Set(input.description),
            thumbnail_url: Set(input.thumbnail_url),
            category: Set(input.category),
            embeds: Set(encode_list(&input.embeds)),
            is_premium: Set(input.is_premium),
            is_live: Set(input.is_live),
            priority: Set(input.priority),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(Self::map_model(model))
    }

    pub async fn update(&self, id: i32, patch: ChannelPatch) -> Result<Option<Channel>> {
        let Some(existing) = Channels::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: channels::ActiveModel = existing.into();
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.name {
            active.name = Set(v);
        }
        if let Some(v) = patch.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = patch.thumbnail_url {
            active.thumbnail_url = Set(Some(v));
        }
        if let Some(v) = patch.category {
            active.category = Set(v);
        }
        if let Some(v) = patch.embeds {
            active.embeds = Set(encode_list(&v));
        }
        if let Some(v) = patch.is_premium {
            active.is_premium = Set(v);
        }
        if let Some(v) = patch.is_live {
            active.is_live = Set(v);
        }
        if let Some(v) = patch.priority {
            active.priority = Set(v);
        }
        active.updated_at = Set(now_millis());

        Ok(Some(Self::map_model(active.update(&self.conn).await?)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Channels::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: String,
    pub embeds: Vec<Embed>,
    pub is_premium: bool,
    pub is_live: bool,
    pub priority: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChannelFilter {
    pub slug: Option<String>,
    pub category: Option<String>,
    pub is_live: Option<bool>,
    pub is_premium: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewChannel {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub category: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub priority: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChannelPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub embeds: Option<Vec<Embed>>,
    pub is_premium: Option<bool>,
    pub is_live: Option<bool>,
    pub priority: Option<i32>,
}
