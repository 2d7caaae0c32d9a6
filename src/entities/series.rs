use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "series")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub tmdb_id: Option<i32>,
    pub title: String,
    pub title_somali: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    /// Airing status as reported by TMDB ("Returning Series", "Ended").
    pub status: Option<String>,
    pub rating: Option<f64>,
    /// JSON array of genre names
    #[sea_orm(column_type = "Text")]
    pub genres: String,
    pub number_of_seasons: i32,
    pub number_of_episodes: i32,
    pub is_dubbed: bool,
    pub is_premium: bool,
    pub is_published: bool,
    pub seo_title: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub seo_description: Option<String>,
    pub views: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
