use crate::domain::{Embed, decode_list, encode_list, now_millis};
use crate::entities::{movies, prelude::*};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

pub struct MovieRepository {
    conn: DatabaseConnection,
}

impl MovieRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Model Conversion Helpers
    // ========================================================================

    fn map_model(m: movies::Model) -> Movie {
        Movie {
            id: m.id,
            slug: m.slug,
            tmdb_id: m.tmdb_id,
            title: m.title,
            title_somali: m.title_somali,
            overview: m.overview,
            poster_url: m.poster_url,
            backdrop_url: m.backdrop_url,
            release_date: m.release_date,
            runtime: m.runtime,
            rating: m.rating,
            genres: decode_list(&m.genres),
            director: m.director,
            embeds: decode_list(&m.embeds),
            is_dubbed: m.is_dubbed,
            is_premium: m.is_premium,
            is_published: m.is_published,
            seo_title: m.seo_title,
            seo_description: m.seo_description,
            views: m.views,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn list(&self, filter: &MovieFilter) -> Result<Vec<Movie>> {
        let mut query = Movies::find().order_by_desc(movies::Column::CreatedAt);

        if let Some(published) = filter.published {
            query = query.filter(movies::Column::IsPublished.eq(published));
        }
        if let Some(premium) = filter.premium {
            query = query.filter(movies::Column::IsPremium.eq(premium));
        }
        if let Some(dubbed) = filter.dubbed {
            query = query.filter(movies::Column::IsDubbed.eq(dubbed));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }

        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Movie>> {
        let row = Movies::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Movie>> {
        let row = Movies::find()
            .filter(movies::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_model))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = Movies::find()
            .filter(movies::Column::Slug.eq(slug))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// Published movies whose genre list contains `genre`.
    pub async fn list_by_genre(&self, genre: &str, limit: u64) -> Result<Vec<Movie>> {
        let needle = serde_json::to_string(genre)?;
        let rows = Movies::find()
            .filter(movies::Column::IsPublished.eq(true))
            .filter(movies::Column::Genres.contains(needle))
            .order_by_desc(movies::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn published_slugs(&self) -> Result<Vec<(String, String)>> {
        let rows: Vec<(String, String)> = Movies::find()
            .select_only()
            .column(movies::Column::Slug)
            .column(movies::Column::Title)
            .filter(movies::Column::IsPublished.eq(true))
            .into_tuple()
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn most_viewed(&self, limit: u64) -> Result<Vec<Movie>> {
        let rows = Movies::find()
            .filter(movies::Column::IsPublished.eq(true))
            .order_by_desc(movies::Column::Views)
            .limit(limit)
            .all(&self.conn)
            .await?;
        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create(&self, input: NewMovie) -> Result<Movie> {
        let now = now_millis();
        let model = movies::ActiveModel {
            slug: Set(input.slug),
            tmdb_id: Set(input.tmdb_id),
            title: Set(input.title),
            title_somali: Set(input.title_somali),
            overview: Set(input.overview),
            poster_url: Set(input.poster_url),
            backdrop_url: Set(input.backdrop_url),
            release_date: Set(input.release_date),
            runtime: Set(input.runtime),
            rating: Set(input.rating),
            genres: Set(encode_list(&input.genres)),
            director: Set(input.director),
            embeds: Set(encode_list(&input.embeds)),
            is_dubbed: Set(input.is_dubbed),
            is_premium: Set(input.is_premium),
            is_published: Set(input.is_published),
            seo_title: Set(input.seo_title),
            seo_description: Set(input.seo_description),
            views: Set(0),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        Ok(Self::map_model(model))
    }

    /// Applies only the fields present in `patch`. Returns `None` for an unknown id.
    pub async fn update(&self, id: i32, patch: MoviePatch) -> Result<Option<Movie>> {
        let Some(existing) = Movies::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: movies::ActiveModel = existing.into();
        if let Some(v) = patch.slug {
            active.slug = Set(v);
        }
        if let Some(v) = patch.title {
            active.title = Set(v);
        }
        if let Some(v) = patch.title_somali {
            active.title_somali = Set(Some(v));
        }
        if let Some(v) = patch.overview {
            active.overview = Set(Some(v));
        }
        if let Some(v) = patch.poster_url {
            active.poster_url = Set(Some(v));
        }
        if let Some(v) = patch.backdrop_url {
            active.backdrop_url = Set(Some(v));
        }
        if let Some(v) = patch.release_date {
            active.release_date = Set(Some(v));
        }
        if let Some(v) = patch.runtime {
            active.runtime = Set(Some(v));
        }
        if let Some(v) = patch.rating {
            active.rating = Set(Some(v));
        }
        if let Some(v) = patch.genres {
            active.genres = Set(encode_list(&v));
        }
        if let Some(v) = patch.director {
            active.director = Set(Some(v));
        }
        if let Some(v) = patch.embeds {
            active.embeds = Set(encode_list(&v));
        }
        if let Some(v) = patch.is_dubbed {
            active.is_dubbed = Set(v);
        }
        if let Some(v) = patch.is_premium {
            active.is_premium = Set(v);
        }
        if let Some(v) = patch.is_published {
            active.is_published = Set(v);
        }
        if let Some(v) = patch.seo_title {
            active.seo_title = Set(Some(v));
        }
        if let Some(v) = patch.seo_description {
            active.seo_description = Set(Some(v));
        }
        active.updated_at = Set(now_millis());

        let model = active.update(&self.conn).await?;
        Ok(Some(Self::map_model(model)))
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Movies::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn increment_views(&self, slug: &str) -> Result<bool> {
        let result = Movies::update_many()
            .col_expr(
                movies::Column::Views,
                Expr::col(movies::Column::Views).add(1),
            )
            .filter(movies::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Movie {
    pub id: i32,
    pub slug: String,
    pub tmdb_id: Option<i32>,
    pub title: String,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub director: Option<String>,
    pub embeds: Vec<Embed>,
    pub is_dubbed: bool,
    pub is_premium: bool,
    pub is_published: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub views: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub published: Option<bool>,
    pub premium: Option<bool>,
    pub dubbed: Option<bool>,
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewMovie {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub tmdb_id: Option<i32>,
    #[serde(default)]
    pub title_somali: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_url: Option<String>,
    #[serde(default)]
    pub backdrop_url: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub director: Option<String>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub is_dubbed: bool,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default)]
    pub seo_title: Option<String>,
    #[serde(default)]
    pub seo_description: Option<String>,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MoviePatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub director: Option<String>,
    pub embeds: Option<Vec<Embed>>,
    pub is_dubbed: Option<bool>,
    pub is_premium: Option<bool>,
    pub is_published: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}
