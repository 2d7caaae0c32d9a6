use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "matches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub slug: String,
    pub title: String,
    pub team_a: String,
    pub team_b: String,
    pub team_a_logo: Option<String>,
    pub team_b_logo: Option<String>,
    pub league_id: Option<String>,
    pub league_name: Option<String>,
    pub kickoff_at: i64,
    /// upcoming | live | finished
    pub status: String,
    pub is_premium: bool,
    pub required_plan: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub embeds: String,
    pub thumbnail_url: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub summary: Option<String>,
    pub score_a: Option<i32>,
    pub score_b: Option<i32>,
    pub minute: Option<i32>,
    pub views: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
