use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A fixture mirrored from API-Football, pending import into `matches`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "fixtures")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub api_fixture_id: i64,
    pub slug: String,
    pub kickoff_at: i64,
    pub kickoff_iso: String,
    pub timezone: String,
    pub status: String,
    pub raw_status_short: String,
    pub raw_status_long: String,
    pub home_name: String,
    pub home_logo: Option<String>,
    pub away_name: String,
    pub away_logo: Option<String>,
    pub league_name: String,
    pub league_logo: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// `YYYY-MM-DD` the fixture was fetched for
    pub fetched_for_date: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
