use crate::domain::now_millis;
use crate::entities::{categories, prelude::*};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;

pub use categories::Model as Category;

/// Rows inserted by `seed_defaults`: (name, slug, colour).
pub const DEFAULT_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Fanproj", "fanproj", "#9AE600"),
    ("Hindi AF Somali", "hindi-af-somali", "#FF6B35"),
    ("Fanproj Play", "fanproj-play", "#3B82F6"),
    ("Fanproj TV", "fanproj-tv", "#8B5CF6"),
];

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self, active_only: bool) -> Result<Vec<Category>> {
        let mut query = Categories::find().order_by_asc(categories::Column::SortOrder);
        if active_only {
            query = query.filter(categories::Column::IsActive.eq(true));
        }
        Ok(query.all(&self.conn).await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?)
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }

    pub async fn create(&self, input: NewCategory) -> Result<Category> {
        let model = categories::ActiveModel {
            name: Set(input.name),
            slug: Set(input.slug),
            description: Set(input.description),
            icon_url: Set(input.icon_url),
            color: Set(input.color),
            sort_order: Set(input.sort_order),
            is_active: Set(input.is_active),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(model)
    }

    pub async fn update(&self, id: i32, patch: CategoryPatch) -> Result<Option<Category>> {
        let Some(existing) = Categories::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: categories::ActiveModel = existing.into();
        if let Some(v) = patch.name {
            active.name = Set(v);
        }
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.description {
            active.description = Set(Some(v));
        }
        if let Some(v) = patch.icon_url {
            active.icon_url = Set(Some(v));
        }
        if let Some(v) = patch.color {
            active.color = Set(Some(v));
        }
        if let Some(v) = patch.sort_order {
            active.sort_order = Set(v);
        }
        if let Some(v) = patch.is_active {
            active.is_active = Set(v);
        }

        Ok(Some(active.update(&self.conn).await?))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Categories::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Inserts the default rows when the table is empty. Returns how many were added.
    pub async fn seed_defaults(&self) -> Result<usize> {
        if Categories::find().count(&self.conn).await? > 0 {
            return Ok(0);
        }

        let now = now_millis();
        let rows = DEFAULT_CATEGORIES
            .iter()
            .zip(1..)
            .map(|(&(name, slug, color), order)| categories::ActiveModel {
                name: Set(name.to_string()),
                slug: Set(slug.to_string()),
                color: Set(Some(color.to_string())),
                sort_order: Set(order),
                is_active: Set(true),
                created_at: Set(now),
                ..Default::default()
            });

        Categories::insert_many(rows).exec(&self.conn).await?;
        Ok(DEFAULT_CATEGORIES.len())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub color: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}
