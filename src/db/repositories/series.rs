use crate::domain::{Embed, decode_list, encode_list, now_millis};
use crate::entities::{episodes, prelude::*, series};
use anyhow::Result;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};

/// TV series and their episodes.
pub struct SeriesRepository {
    conn: DatabaseConnection,
}

impl SeriesRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_series(m: series::Model) -> Series {
        Series {
            id: m.id,
            slug: m.slug,
            tmdb_id: m.tmdb_id,
            title: m.title,
            title_somali: m.title_somali,
            overview: m.overview,
            poster_url: m.poster_url,
            backdrop_url: m.backdrop_url,
            first_air_date: m.first_air_date,
            last_air_date: m.last_air_date,
            status: m.status,
            rating: m.rating,
            genres: decode_list(&m.genres),
            number_of_seasons: m.number_of_seasons,
            number_of_episodes: m.number_of_episodes,
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

    fn map_episode(m: episodes::Model) -> Episode {
        Episode {
            id: m.id,
            series_id: m.series_id,
            season_number: m.season_number,
            episode_number: m.episode_number,
            title: m.title,
            title_somali: m.title_somali,
            overview: m.overview,
            still_url: m.still_url,
            air_date: m.air_date,
            runtime: m.runtime,
            embeds: decode_list(&m.embeds),
            is_published: m.is_published,
            created_at: m.created_at,
        }
    }

    // ========================================================================
    // Series
    // ========================================================================

    pub async fn list(&self, published: Option<bool>, limit: Option<u64>) -> Result<Vec<Series>> {
        let mut query = series::Entity::find().order_by_desc(series::Column::CreatedAt);
        if let Some(published) = published {
            query = query.filter(series::Column::IsPublished.eq(published));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_series).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<Series>> {
        let row = series::Entity::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_series))
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Series>> {
        let row = series::Entity::find()
            .filter(series::Column::Slug.eq(slug))
            .one(&self.conn)
            .await?;
        Ok(row.map(Self::map_series))
    }

    pub async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let count = series::Entity::find()
            .filter(series::Column::Slug.eq(slug))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, input: NewSeries) -> Result<Series> {
        let now = now_millis();
        let model = series::ActiveModel {
            slug: Set(input.slug),
            tmdb_id: Set(input.tmdb_id),
            title: Set(input.title),
            title_somali: Set(input.title_somali),
            overview: Set(input.overview),
            poster_url: Set(input.poster_url),
            backdrop_url: Set(input.backdrop_url),
            first_air_date: Set(input.first_air_date),
            last_air_date: Set(input.last_air_date),
            status: Set(input.status),
            rating: Set(input.rating),
            genres: Set(encode_list(&input.genres)),
            number_of_seasons: Set(input.number_of_seasons),
            number_of_episodes: Set(input.number_of_episodes),
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

        Ok(Self::map_series(model))
    }

    pub async fn update(&self, id: i32, patch: SeriesPatch) -> Result<Option<Series>> {
        let Some(existing) = series::Entity::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: series::ActiveModel = existing.into();
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
        if let Some(v) = patch.first_air_date {
            active.first_air_date = Set(Some(v));
        }
        if let Some(v) = patch.last_air_date {
            active.last_air_date = Set(Some(v));
        }
        if let Some(v) = patch.status {
            active.status = Set(Some(v));
        }
        if let Some(v) = patch.rating {
            active.rating = Set(Some(v));
        }
        if let Some(v) = patch.genres {
            active.genres = Set(encode_list(&v));
        }
        if let Some(v) = patch.number_of_seasons {
            active.number_of_seasons = Set(v);
        }
        if let Some(v) = patch.number_of_episodes {
            active.number_of_episodes = Set(v);
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
        Ok(Some(Self::map_series(model)))
    }

    /// Deletes the series and every episode that belongs to it.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;
        Episodes::delete_many()
            .filter(episodes::Column::SeriesId.eq(id))
            .exec(&txn)
            .await?;
        let result = series::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn increment_views(&self, slug: &str) -> Result<bool> {
        let result = series::Entity::update_many()
            .col_expr(
                series::Column::Views,
                Expr::col(series::Column::Views).add(1),
            )
            .filter(series::Column::Slug.eq(slug))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Episodes
    // ========================================================================

    /// Episodes ordered by season, then episode number.
    pub async fn episodes(&self, series_id: i32, published_only: bool) -> Result<Vec<Episode>> {
        let mut query = Episodes::find()
            .filter(episodes::Column::SeriesId.eq(series_id))
            .order_by_asc(episodes::Column::SeasonNumber)
            .order_by_asc(episodes::Column::EpisodeNumber);
        if published_only {
            query = query.filter(episodes::Column::IsPublished.eq(true));
        }
        let rows = query.all(&self.conn).await?;
        Ok(rows.into_iter().map(Self::map_episode).collect())
    }

    pub async fn get_episode(&self, id: i32) -> Result<Option<Episode>> {
        let row = Episodes::find_by_id(id).one(&self.conn).await?;
        Ok(row.map(Self::map_episode))
    }

    pub async fn episode_exists(&self, series_id: i32, season: i32, episode: i32) -> Result<bool> {
        let count = Episodes::find()
            .filter(episodes::Column::SeriesId.eq(series_id))
            .filter(episodes::Column::SeasonNumber.eq(season))
            .filter(episodes::Column::EpisodeNumber.eq(episode))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn create_episode(&self, series_id: i32, input: NewEpisode) -> Result<Episode> {
        let model = episodes::ActiveModel {
            series_id: Set(series_id),
            season_number: Set(input.season_number),
            episode_number: Set(input.episode_number),
            title: Set(input.title),
            title_somali: Set(input.title_somali),
            overview: Set(input.overview),
            still_url: Set(input.still_url),
            air_date: Set(input.air_date),
            runtime: Set(input.runtime),
            embeds: Set(encode_list(&input.embeds)),
            is_published: Set(input.is_published),
            created_at: Set(now_millis()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;
        Ok(Self::map_episode(model))
    }

    pub async fn update_episode(&self, id: i32, patch: EpisodePatch) -> Result<Option<Episode>> {
        let Some(existing) = Episodes::find_by_id(id).one(&self.conn).await? else {
            return Ok(None);
        };

        let mut active: episodes::ActiveModel = existing.into();
        if let Some(v) = patch.season_number {
            active.season_number = Set(v);
        }
        if let Some(v) = patch.episode_number {
            active.episode_number = Set(v);
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
        if let Some(v) = patch.still_url {
            active.still_url = Set(Some(v));
        }
        if let Some(v) = patch.air_date {
            active.air_date = Set(Some(v));
        }
        if let Some(v) = patch.runtime {
            active.runtime = Set(Some(v));
        }
        if let Some(v) = patch.embeds {
            active.embeds = Set(encode_list(&v));
        }
        if let Some(v) = patch.is_published {
            active.is_published = Set(v);
        }

        let model = active.update(&self.conn).await?;
        Ok(Some(Self::map_episode(model)))
    }

    pub async fn delete_episode(&self, id: i32) -> Result<bool> {
        let result = Episodes::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Data Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub id: i32,
    pub slug: String,
    pub tmdb_id: Option<i32>,
    pub title: String,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub genres: Vec<String>,
    pub number_of_seasons: i32,
    pub number_of_episodes: i32,
    pub is_dubbed: bool,
    pub is_premium: bool,
    pub is_published: bool,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub views: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Episode {
    pub id: i32,
    pub series_id: i32,
    pub season_number: i32,
    pub episode_number: i32,
    pub title: String,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub embeds: Vec<Embed>,
    pub is_published: bool,
    pub created_at: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSeries {
    #[serde(default)]
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
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub last_air_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub number_of_seasons: i32,
    #[serde(default)]
    pub number_of_episodes: i32,
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

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeriesPatch {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub status: Option<String>,
    pub rating: Option<f64>,
    pub genres: Option<Vec<String>>,
    pub number_of_seasons: Option<i32>,
    pub number_of_episodes: Option<i32>,
    pub is_dubbed: Option<bool>,
    pub is_premium: Option<bool>,
    pub is_published: Option<bool>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEpisode {
    pub season_number: i32,
    pub episode_number: i32,
    pub title: String,
    #[serde(default)]
    pub title_somali: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub still_url: Option<String>,
    #[serde(default)]
    pub air_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<i32>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default = "default_true")]
    pub is_published: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EpisodePatch {
    pub season_number: Option<i32>,
    pub episode_number: Option<i32>,
    pub title: Option<String>,
    pub title_somali: Option<String>,
    pub overview: Option<String>,
    pub still_url: Option<String>,
    pub air_date: Option<String>,
    pub runtime: Option<i32>,
    pub embeds: Option<Vec<Embed>>,
    pub is_published: Option<bool>,
}

const fn default_true() -> bool {
    true
}
